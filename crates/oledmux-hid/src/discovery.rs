use hidapi::{DeviceInfo, HidApi};
use tracing::{info, warn};

use crate::error::{Result, TransportError};
use crate::transport::HidDeviceHandle;

/// Criteria for locating the keyboard's raw HID interface.
///
/// Usage and usage page are only reported on Windows and macOS; on Linux
/// the interface number is matched instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    /// USB vendor id.
    pub vendor_id: u16,
    /// USB product id.
    pub product_id: u16,
    /// HID usage of the raw interface (Windows/macOS).
    pub usage: u16,
    /// HID usage page of the raw interface (Windows/macOS).
    pub usage_page: u16,
    /// USB interface number of the raw interface (Linux).
    pub interface: i32,
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self {
            vendor_id: 0xFC51,
            product_id: 0x0058,
            usage: 0x0061,
            usage_page: 0xFF60,
            interface: 1,
        }
    }
}

impl DeviceSelector {
    fn matches(&self, info: &DeviceInfo) -> bool {
        if info.vendor_id() != self.vendor_id || info.product_id() != self.product_id {
            return false;
        }

        #[cfg(target_os = "linux")]
        {
            // Usage pages are not exposed through hidraw; the interface
            // number is the best available discriminator.
            info.interface_number() == self.interface
        }
        #[cfg(not(target_os = "linux"))]
        {
            info.usage() == self.usage && info.usage_page() == self.usage_page
        }
    }
}

/// Re-enumerate and open the first device matching `selector`.
///
/// Returns `Ok(None)` when no matching device is currently attached. A
/// matching device that fails to open is logged and skipped, so a stale
/// enumeration entry does not wedge the caller's retry loop.
pub fn open_device(api: &mut HidApi, selector: &DeviceSelector) -> Result<Option<HidDeviceHandle>> {
    api.refresh_devices().map_err(TransportError::Init)?;

    for info in api.device_list() {
        if !selector.matches(info) {
            continue;
        }

        info!(
            path = ?info.path(),
            usage = info.usage(),
            usage_page = info.usage_page(),
            "found device"
        );

        match info.open_device(api) {
            Ok(device) => return Ok(Some(HidDeviceHandle::new(device))),
            Err(err) => {
                warn!(path = ?info.path(), error = %err, "failed to open device");
            }
        }
    }

    Ok(None)
}
