//! Raw HID transport and device discovery.
//!
//! Provides the [`HidTransport`] trait — write one fixed-size report, read
//! one with a bounded timeout — and its `hidapi`-backed production
//! implementation. The session core only ever sees the trait, so tests can
//! substitute scripted in-memory transports.

pub mod discovery;
pub mod error;
pub mod transport;

pub use discovery::{open_device, DeviceSelector};
pub use error::{Result, TransportError};
pub use transport::{HidDeviceHandle, HidTransport};
