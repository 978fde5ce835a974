/// Errors that can occur in HID transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The hidapi context could not be created or refreshed.
    #[error("hidapi unavailable: {0}")]
    Init(#[source] hidapi::HidError),

    /// A matching device was found but could not be opened.
    #[error("failed to open device {vendor_id:04x}:{product_id:04x}: {source}")]
    Open {
        vendor_id: u16,
        product_id: u16,
        source: hidapi::HidError,
    },

    /// A report write failed at the HID layer.
    #[error("device write failed: {0}")]
    Write(#[source] hidapi::HidError),

    /// A report read failed at the HID layer (not a timeout).
    #[error("device read failed: {0}")]
    Read(#[source] hidapi::HidError),
}

pub type Result<T> = std::result::Result<T, TransportError>;
