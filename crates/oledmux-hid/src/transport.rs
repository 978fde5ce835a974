use std::time::Duration;

use oledmux_report::{Report, REPORT_SIZE};

use crate::error::{Result, TransportError};

/// A bidirectional raw HID link carrying fixed-size reports.
///
/// This is the only seam between the session core and the physical device.
/// Implementations must be shareable across the read loop and the screen
/// writers; hidapi device handles are internally synchronized.
pub trait HidTransport: Send + Sync {
    /// Write one outbound report (blocking).
    fn write_report(&self, report: &Report) -> Result<()>;

    /// Read one inbound report, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when the timeout elapses without a report
    /// arriving. Short reads are zero-padded to [`REPORT_SIZE`].
    fn read_report(&self, timeout: Duration) -> Result<Option<Report>>;
}

/// Production transport over an opened hidapi device.
pub struct HidDeviceHandle {
    device: hidapi::HidDevice,
}

impl HidDeviceHandle {
    pub fn new(device: hidapi::HidDevice) -> Self {
        Self { device }
    }
}

impl HidTransport for HidDeviceHandle {
    fn write_report(&self, report: &Report) -> Result<()> {
        self.device.write(report).map_err(TransportError::Write)?;
        Ok(())
    }

    fn read_report(&self, timeout: Duration) -> Result<Option<Report>> {
        let mut buf = [0u8; REPORT_SIZE];
        let millis = timeout.as_millis().min(i32::MAX as u128) as i32;
        let size = self
            .device
            .read_timeout(&mut buf, millis)
            .map_err(TransportError::Read)?;

        if size == 0 {
            return Ok(None);
        }
        Ok(Some(buf))
    }
}

impl std::fmt::Debug for HidDeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidDeviceHandle").finish_non_exhaustive()
    }
}

// `hidapi::HidDevice` is `Send` but not `Sync` in hidapi 2.x. The transport
// contract above requires `Send + Sync` ("hidapi device handles are internally
// synchronized"), and the session layer shares a single handle as
// `Arc<dyn HidTransport>` across the read loop and the screen writers. Assert
// the invariant the design already relies on.
unsafe impl Sync for HidDeviceHandle {}
