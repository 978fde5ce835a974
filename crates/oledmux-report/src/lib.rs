//! Fixed-size HID report framing for the oledmux screen protocol.
//!
//! Every exchange with the firmware is one 32-byte raw HID report:
//! - Byte 0 classifies the report (command marker, result code, or event marker)
//! - Byte 1 carries the command or event identifier
//! - Byte 2 addresses a screen
//! - Bytes 3..31 are the message-specific payload
//!
//! No partial reports, no stream resynchronization — the transport delivers
//! whole reports or nothing.

pub mod codec;
pub mod error;
pub mod ids;

pub use codec::{decode_report, encode_command, Message, Report, MAX_PAYLOAD, REPORT_SIZE};
pub use error::{ReportError, Result};
pub use ids::{CommandId, EventId, ScreenId, COMMAND_MSG, EVENT_MSG, RESULT_FAILURE, RESULT_SUCCESS};
