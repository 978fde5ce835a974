use bytes::Bytes;

use crate::error::{ReportError, Result};
use crate::ids::{CommandId, EventId, ScreenId, COMMAND_MSG, EVENT_MSG, RESULT_FAILURE, RESULT_SUCCESS};

/// Size of every report exchanged with the firmware, in bytes.
pub const REPORT_SIZE: usize = 32;

/// Maximum command payload: everything after the 3-byte header.
pub const MAX_PAYLOAD: usize = REPORT_SIZE - 3;

/// One raw HID report.
pub type Report = [u8; REPORT_SIZE];

/// A decoded inbound report.
///
/// Responses echo the command and screen they answer; events originate in
/// the firmware (key presses mapped to tag actions). Both are immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Outcome of a previously sent command.
    Response {
        /// Whether the firmware applied the command.
        success: bool,
        /// The command being answered.
        command: CommandId,
        /// The screen the command addressed.
        screen: ScreenId,
        /// Result payload (e.g. geometry for `SetUp`).
        params: Bytes,
    },
    /// A notification initiated by the firmware.
    Event {
        /// What happened.
        event: EventId,
        /// The screen it concerns.
        screen: ScreenId,
        /// Event payload (e.g. the target tag for `ChangeTag`).
        params: Bytes,
    },
}

impl Message {
    /// The screen this message concerns.
    pub fn screen(&self) -> ScreenId {
        match self {
            Message::Response { screen, .. } | Message::Event { screen, .. } => *screen,
        }
    }
}

/// Encode a command into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────────┬─────────────┬────────────┬──────────────────┐
/// │ Marker (1B)   │ Command     │ Screen     │ Payload           │
/// │ 0xC0          │ (1B)        │ (1B)       │ (29B, zero-pad)   │
/// └───────────────┴─────────────┴────────────┴──────────────────┘
/// ```
///
/// Payload beyond [`MAX_PAYLOAD`] bytes is silently truncated; staying
/// within the limit is the caller's contract.
pub fn encode_command(command: CommandId, screen: ScreenId, payload: &[u8]) -> Report {
    let mut report = [0u8; REPORT_SIZE];
    report[0] = COMMAND_MSG;
    report[1] = command as u8;
    report[2] = screen as u8;

    let len = payload.len().min(MAX_PAYLOAD);
    report[3..3 + len].copy_from_slice(&payload[..len]);
    report
}

/// Decode an inbound report.
///
/// Returns `Ok(None)` for an empty buffer (a timed-out read produced no
/// report). A failure response decodes successfully — `success: false` is a
/// command outcome, not a transport or protocol error.
pub fn decode_report(buf: &[u8]) -> Result<Option<Message>> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf.len() < 3 {
        return Err(ReportError::Truncated { len: buf.len() });
    }

    match buf[0] {
        RESULT_SUCCESS | RESULT_FAILURE => Ok(Some(Message::Response {
            success: buf[0] == RESULT_SUCCESS,
            command: CommandId::try_from(buf[1])?,
            screen: ScreenId::try_from(buf[2])?,
            params: Bytes::copy_from_slice(&buf[3..]),
        })),
        EVENT_MSG => Ok(Some(Message::Event {
            event: EventId::try_from(buf[1])?,
            screen: ScreenId::try_from(buf[2])?,
            params: Bytes::copy_from_slice(&buf[3..]),
        })),
        other => Err(ReportError::UnknownMessage(other)),
    }
}
