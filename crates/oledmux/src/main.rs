mod logging;
mod supervisor;
mod tags;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use oledmux_hid::DeviceSelector;
use oledmux_session::{SessionConfig, TagRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::logging::{init_logging, LogFormat};
use crate::tags::TagConfig;

#[derive(Parser, Debug)]
#[command(
    name = "oledmux",
    version,
    about = "Show live system information on QMK OLED screens"
)]
struct Cli {
    /// Log wire traffic and state transitions.
    #[arg(long)]
    debug: bool,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// USB vendor id of the keyboard.
    #[arg(long, value_name = "HEX", value_parser = parse_hex_u16, default_value = "fc51")]
    vendor_id: u16,

    /// USB product id of the keyboard.
    #[arg(long, value_name = "HEX", value_parser = parse_hex_u16, default_value = "0058")]
    product_id: u16,

    /// HID usage of the raw interface (Windows/macOS).
    #[arg(long, value_name = "HEX", value_parser = parse_hex_u16, default_value = "0061")]
    usage: u16,

    /// HID usage page of the raw interface (Windows/macOS).
    #[arg(long, value_name = "HEX", value_parser = parse_hex_u16, default_value = "ff60")]
    usage_page: u16,

    /// USB interface number of the raw interface (Linux).
    #[arg(long, value_name = "NUM", default_value_t = 1)]
    interface: i32,

    /// Tag shown on the primary screen at start.
    #[arg(long, value_name = "TAG", default_value_t = 1)]
    primary_tag: u8,

    /// Tag shown on the secondary screen at start.
    #[arg(long, value_name = "TAG", default_value_t = 2)]
    secondary_tag: u8,

    /// Disk to monitor for I/O usage (Linux).
    #[arg(long, value_name = "NAME", default_value = "sda")]
    sysstat_disk: String,
}

fn parse_hex_u16(value: &str) -> Result<u16, String> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|err| format!("invalid hex value '{value}': {err}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.debug);
    info!("started");

    let quit = CancellationToken::new();
    tokio::spawn(signal_listener(quit.clone()));

    let mut registry = TagRegistry::new();
    tags::register_builtin(
        &mut registry,
        &TagConfig {
            sysstat_disk: cli.sysstat_disk.clone(),
            ..TagConfig::default()
        },
    );

    let selector = DeviceSelector {
        vendor_id: cli.vendor_id,
        product_id: cli.product_id,
        usage: cli.usage,
        usage_page: cli.usage_page,
        interface: cli.interface,
    };
    let config = SessionConfig {
        primary_tag: cli.primary_tag,
        secondary_tag: cli.secondary_tag,
        ..SessionConfig::default()
    };

    match supervisor::run(selector, Arc::new(registry), config, quit).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "cannot talk to the HID layer");
            ExitCode::FAILURE
        }
    }
}

/// Resolve SIGINT/SIGTERM into the external-quit token. Everything else
/// (device unplug, read failures) is handled by reconnecting.
async fn signal_listener(quit: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("stopping on signal");
    quit.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["oledmux"]).expect("defaults should parse");
        assert_eq!(cli.vendor_id, 0xFC51);
        assert_eq!(cli.product_id, 0x0058);
        assert_eq!(cli.usage_page, 0xFF60);
        assert_eq!(cli.interface, 1);
        assert_eq!(cli.primary_tag, 1);
        assert_eq!(cli.secondary_tag, 2);
        assert_eq!(cli.sysstat_disk, "sda");
        assert!(!cli.debug);
    }

    #[test]
    fn parses_selector_overrides() {
        let cli = Cli::try_parse_from([
            "oledmux",
            "--vendor-id",
            "0x1234",
            "--product-id",
            "abcd",
            "--interface",
            "2",
            "--debug",
        ])
        .expect("overrides should parse");
        assert_eq!(cli.vendor_id, 0x1234);
        assert_eq!(cli.product_id, 0xABCD);
        assert_eq!(cli.interface, 2);
        assert!(cli.debug);
    }

    #[test]
    fn rejects_non_hex_ids() {
        let err = Cli::try_parse_from(["oledmux", "--vendor-id", "notahex"])
            .expect_err("junk vendor id should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
