//! Device session and per-screen state machine.
//!
//! One [`DeviceSession`] owns the transport for its whole lifetime: it
//! performs the set-up handshake, runs the single read loop, fans firmware
//! events out to one [`screen::ScreenTask`] per display, and supervises
//! orderly shutdown. Screens never touch the transport directly — they hold
//! a [`CommandWriter`], the narrow encode-and-send capability.
//!
//! Content comes from [`TagSource`] producers selected through an immutable
//! [`TagRegistry`]. The one invariant everything here is built around: at
//! most one producer is ever live per screen, and on a tag switch the
//! successor starts only after the predecessor's frame stream has closed.

pub mod error;
pub mod producer;
pub mod registry;
pub mod screen;
pub mod session;
pub mod writer;

pub use error::{Result, SessionError};
pub use producer::{Area, TagFrame, TagIndex, TagSource, FRAME_CHANNEL_CAPACITY};
pub use registry::TagRegistry;
pub use screen::TagEvent;
pub use session::{DeviceSession, SessionConfig, SessionEnd};
pub use writer::CommandWriter;
