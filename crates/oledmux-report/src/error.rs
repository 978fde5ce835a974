/// Errors that can occur while decoding inbound reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The leading byte is not a known result code or event marker.
    #[error("unknown message class 0x{0:02X}")]
    UnknownMessage(u8),

    /// The command identifier byte is not a known command.
    #[error("unknown command id 0x{0:02X}")]
    UnknownCommand(u8),

    /// The event identifier byte is not a known event.
    #[error("unknown event id 0x{0:02X}")]
    UnknownEvent(u8),

    /// The screen identifier byte does not address a known screen.
    #[error("unknown screen id 0x{0:02X}")]
    UnknownScreen(u8),

    /// The report is non-empty but too short to carry a header.
    #[error("truncated report ({len} bytes)")]
    Truncated { len: usize },
}

pub type Result<T> = std::result::Result<T, ReportError>;
