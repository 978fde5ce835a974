use std::time::Duration;

use oledmux_session::{Area, TagFrame, TagSource, FRAME_CHANNEL_CAPACITY};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::tags::bars::bar_line;

const LABELS: [&str; 4] = ["CPU%", "Mem%", "Swap", "Disk"];

/// System utilization view: CPU, memory, swap, and disk busy time as bar
/// graphs, sampled from /proc.
pub struct SysStats {
    disk: String,
    interval: Duration,
}

impl SysStats {
    pub fn new(disk: String, interval: Duration) -> Self {
        Self { disk, interval }
    }
}

impl TagSource for SysStats {
    #[cfg(target_os = "linux")]
    fn start(&self, area: Area, cancel: CancellationToken) -> mpsc::Receiver<TagFrame> {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let disk = self.disk.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            let mut sampler = Sampler::new(disk);
            loop {
                let values = sampler.sample();
                let frame = render(&values, area.width);
                if tx.send(frame).await.is_err() {
                    return;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        rx
    }

    #[cfg(not(target_os = "linux"))]
    fn start(&self, _area: Area, _cancel: CancellationToken) -> mpsc::Receiver<TagFrame> {
        tracing::warn!("system stats are only available on linux");
        let (_tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        rx
    }
}

fn render(values: &[f64; 4], width: u8) -> TagFrame {
    LABELS
        .iter()
        .zip(values)
        .map(|(label, &value)| bar_line(label, value, width))
        .collect()
}

/// Incremental /proc reader. CPU and disk figures are deltas, so the first
/// sample reports them as zero.
#[cfg(target_os = "linux")]
struct Sampler {
    disk: String,
    prev_cpu: Option<CpuTimes>,
    prev_disk: Option<DiskTimes>,
}

#[cfg(target_os = "linux")]
impl Sampler {
    fn new(disk: String) -> Self {
        Self {
            disk,
            prev_cpu: None,
            prev_disk: None,
        }
    }

    /// Current [cpu, mem, swap, disk] fractions.
    fn sample(&mut self) -> [f64; 4] {
        let cpu = match std::fs::read_to_string("/proc/stat") {
            Ok(text) => self.cpu_fraction(&text),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read /proc/stat");
                0.0
            }
        };

        let (mem, swap) = match std::fs::read_to_string("/proc/meminfo") {
            Ok(text) => memory_fractions(&text),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read /proc/meminfo");
                (0.0, 0.0)
            }
        };

        let disk = match (
            std::fs::read_to_string("/proc/diskstats"),
            std::fs::read_to_string("/proc/uptime"),
        ) {
            (Ok(diskstats), Ok(uptime)) => self.disk_fraction(&diskstats, &uptime),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(error = %err, "failed to read disk statistics");
                0.0
            }
        };

        [cpu, mem, swap, disk]
    }

    fn cpu_fraction(&mut self, stat: &str) -> f64 {
        let Some(current) = parse_cpu_times(stat) else {
            tracing::warn!("no cpu line in /proc/stat");
            return 0.0;
        };

        let fraction = match &self.prev_cpu {
            Some(prev) => {
                let total_delta = current.total.saturating_sub(prev.total);
                let idle_delta = current.idle.saturating_sub(prev.idle);
                if total_delta == 0 {
                    0.0
                } else {
                    (total_delta - idle_delta.min(total_delta)) as f64 / total_delta as f64
                }
            }
            None => 0.0,
        };

        self.prev_cpu = Some(current);
        fraction
    }

    fn disk_fraction(&mut self, diskstats: &str, uptime: &str) -> f64 {
        let (Some(io_ticks), Some(uptime)) =
            (parse_io_ticks(diskstats, &self.disk), parse_uptime(uptime))
        else {
            return 0.0;
        };

        let current = DiskTimes { io_ticks, uptime };
        let fraction = match &self.prev_disk {
            Some(prev) if current.uptime > prev.uptime => {
                let busy_ms = current.io_ticks.saturating_sub(prev.io_ticks) as f64;
                (busy_ms / ((current.uptime - prev.uptime) * 1000.0)).max(0.0)
            }
            _ => 0.0,
        };

        self.prev_disk = Some(current);
        fraction
    }
}

#[cfg(target_os = "linux")]
struct DiskTimes {
    io_ticks: u64,
    uptime: f64,
}

struct CpuTimes {
    idle: u64,
    total: u64,
}

/// Aggregate cpu line: `cpu user nice system idle iowait irq softirq steal ...`.
fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|line| line.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|field| field.parse().ok())
        .collect();
    if fields.len() < 8 {
        return None;
    }

    let idle = fields[3] + fields[4];
    let non_idle = fields[0] + fields[1] + fields[2] + fields[5] + fields[6] + fields[7];
    Some(CpuTimes {
        idle,
        total: idle + non_idle,
    })
}

/// Used-memory and used-swap fractions from /proc/meminfo.
fn memory_fractions(meminfo: &str) -> (f64, f64) {
    let field = |key: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|line| line.starts_with(key))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };

    let mem = match (field("MemTotal:"), field("MemAvailable:")) {
        (Some(total), Some(available)) if total > 0 => {
            total.saturating_sub(available) as f64 / total as f64
        }
        _ => 0.0,
    };
    // Swap may be absent entirely; that reads as zero, not an error.
    let swap = match (field("SwapTotal:"), field("SwapFree:")) {
        (Some(total), Some(free)) if total > 0 => total.saturating_sub(free) as f64 / total as f64,
        _ => 0.0,
    };

    (mem, swap)
}

/// Milliseconds spent doing I/O (field 13 of /proc/diskstats) for `disk`.
fn parse_io_ticks(diskstats: &str, disk: &str) -> Option<u64> {
    for line in diskstats.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.get(2) == Some(&disk) {
            return fields.get(12)?.parse().ok();
        }
    }
    None
}

/// Total uptime in seconds (first field of /proc/uptime).
fn parse_uptime(uptime: &str) -> Option<f64> {
    uptime.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 20 50 800 30 5 15 10 0 0\ncpu0 50 10 25 400 15 2 8 5 0 0\n";

    #[test]
    fn cpu_times_aggregate_idle_and_busy() {
        let times = parse_cpu_times(STAT).unwrap();
        assert_eq!(times.idle, 830);
        assert_eq!(times.total, 830 + 200);
    }

    #[test]
    fn missing_cpu_line_is_none() {
        assert!(parse_cpu_times("intr 0 0\n").is_none());
    }

    #[test]
    fn memory_fractions_from_meminfo() {
        let meminfo = "MemTotal:       16000 kB\nMemAvailable:   12000 kB\nSwapTotal:       4000 kB\nSwapFree:        3000 kB\n";
        let (mem, swap) = memory_fractions(meminfo);
        assert!((mem - 0.25).abs() < 1e-9);
        assert!((swap - 0.25).abs() < 1e-9);
    }

    #[test]
    fn absent_swap_reads_as_zero() {
        let meminfo = "MemTotal:       16000 kB\nMemAvailable:    8000 kB\nSwapTotal:          0 kB\nSwapFree:           0 kB\n";
        let (mem, swap) = memory_fractions(meminfo);
        assert!((mem - 0.5).abs() < 1e-9);
        assert_eq!(swap, 0.0);
    }

    #[test]
    fn io_ticks_match_disk_by_name() {
        let diskstats = "   8       0 sda 1000 0 0 0 2000 0 0 0 0 4500 0\n   8       1 sda1 10 0 0 0 20 0 0 0 0 45 0\n";
        assert_eq!(parse_io_ticks(diskstats, "sda"), Some(4500));
        assert_eq!(parse_io_ticks(diskstats, "sda1"), Some(45));
        assert_eq!(parse_io_ticks(diskstats, "nvme0n1"), None);
    }

    #[test]
    fn uptime_takes_first_field() {
        assert_eq!(parse_uptime("1234.56 8901.23\n"), Some(1234.56));
        assert_eq!(parse_uptime(""), None);
    }

    #[test]
    fn render_produces_one_bar_per_metric() {
        let frame = render(&[0.0, 0.5, 1.0, 0.25], 21);
        assert_eq!(frame.len(), 4);
        assert!(frame[0].starts_with("CPU%["));
        assert!(frame[3].starts_with("Disk["));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn first_cpu_sample_is_zero_then_deltas() {
        let mut sampler = Sampler::new("sda".to_string());
        assert_eq!(sampler.cpu_fraction(STAT), 0.0);

        // 100 more ticks, 40 of them idle.
        let later = "cpu  140 30 60 830 40 5 15 10 0 0\n";
        let fraction = sampler.cpu_fraction(later);
        assert!((fraction - 0.6).abs() < 1e-9, "got {fraction}");
    }
}
