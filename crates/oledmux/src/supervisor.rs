use std::sync::Arc;
use std::time::Duration;

use hidapi::HidApi;
use oledmux_hid::{open_device, DeviceSelector, HidTransport, TransportError};
use oledmux_session::{DeviceSession, SessionConfig, SessionEnd, TagRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause between enumeration attempts while no device is attached, and
/// before reconnecting after a lost session.
const RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Run sessions against the device until an external quit.
///
/// Repeatedly enumerates and opens the target device; each successful open
/// runs one [`DeviceSession`] to completion. A lost transport or a failed
/// handshake re-enters the retry loop; only `quit` ends it.
pub async fn run(
    selector: DeviceSelector,
    registry: Arc<TagRegistry>,
    config: SessionConfig,
    quit: CancellationToken,
) -> Result<(), TransportError> {
    let mut api = HidApi::new().map_err(TransportError::Init)?;

    loop {
        if quit.is_cancelled() {
            return Ok(());
        }

        match open_device(&mut api, &selector) {
            Ok(Some(handle)) => {
                let session = DeviceSession::new(
                    Arc::new(handle) as Arc<dyn HidTransport>,
                    Arc::clone(&registry),
                    config.clone(),
                );
                match session.run(quit.clone()).await {
                    Ok(SessionEnd::Quit) => {
                        info!("session ended on quit");
                        return Ok(());
                    }
                    Ok(SessionEnd::TransportLost) => {
                        warn!("device lost, reconnecting");
                    }
                    Err(err) => {
                        warn!(error = %err, "session failed");
                    }
                }
            }
            Ok(None) => {
                debug!(
                    vendor_id = %format_args!("{:04x}", selector.vendor_id),
                    product_id = %format_args!("{:04x}", selector.product_id),
                    "no device found"
                );
            }
            Err(err) => {
                warn!(error = %err, "device enumeration failed");
            }
        }

        tokio::select! {
            _ = quit.cancelled() => return Ok(()),
            _ = tokio::time::sleep(RETRY_INTERVAL) => {}
        }
    }
}
