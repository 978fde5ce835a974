//! Built-in tags.
//!
//! Each tag is a [`TagSource`] registered under the number the firmware
//! sends for it (`ChangeTag` carries the digit that was pressed, so tag 1
//! is the "1" key). The set is closed; adding a view means adding a
//! variant here and registering it below.

pub mod bars;
pub mod general_info;
pub mod sys_stats;

use std::time::Duration;

use oledmux_session::TagRegistry;

use crate::tags::general_info::GeneralInfo;
use crate::tags::sys_stats::SysStats;

/// Configuration shared by the built-in producers.
#[derive(Debug, Clone)]
pub struct TagConfig {
    /// Disk whose I/O busy time the system-stats tag graphs.
    pub sysstat_disk: String,
    /// Sampling interval of the polling producers.
    pub interval: Duration,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            sysstat_disk: "sda".to_string(),
            interval: Duration::from_secs(1),
        }
    }
}

/// Register the built-in tags.
pub fn register_builtin(registry: &mut TagRegistry, config: &TagConfig) {
    registry.insert(1, Box::new(GeneralInfo::new(config.interval)));
    registry.insert(
        2,
        Box::new(SysStats::new(config.sysstat_disk.clone(), config.interval)),
    );
}
