use std::time::Duration;

/// Errors that can end a device session.
///
/// Only session-start (handshake) failures and read-loop transport failures
/// surface here; per-command write failures and in-loop protocol errors are
/// logged and absorbed where they occur.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] oledmux_hid::TransportError),

    /// Protocol-level decode error during the handshake.
    #[error("protocol error: {0}")]
    Report(#[from] oledmux_report::ReportError),

    /// No handshake response arrived in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The handshake response was not a successful set-up answer.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The device reported a geometry no screen can have.
    #[error("device reported unusable geometry {columns}x{rows}")]
    BadGeometry { columns: u8, rows: u8 },

    /// A session task panicked or was aborted.
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
