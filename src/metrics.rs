//! System metrics sampling for the dashboard.
//!
//! Cross-platform readings via sysinfo:
//! - CPU usage (measured between cycles, the handles are persistent)
//! - Memory usage statistics
//! - Disk usage aggregated over mounted filesystems
//! - Network counters aggregated over interfaces
//!
//! Every sub-reading degrades independently: an unreadable metric becomes a
//! `None` field in the sample, never a failed cycle.

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{Disks, Networks, System};
use tracing::debug;

use crate::error::MonitorError;
use crate::messages::now_rfc3339;

/// CPU usage metrics
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CpuMetrics {
    pub usage_percent: f32,
    pub core_count: usize,
}

/// Memory usage metrics
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryMetrics {
    pub usage_percent: f32,
    pub used_gb: f64,
    pub total_gb: f64,
}

/// Disk usage aggregated over all mounted filesystems
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiskMetrics {
    pub usage_percent: f32,
    pub used_gb: f64,
    pub total_gb: f64,
}

/// Network counters aggregated over all interfaces
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NetworkMetrics {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// One full sample, served on /system/metrics and projected into the
/// flat snapshot used for alert evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    pub cpu: Option<CpuMetrics>,
    pub memory: Option<MemoryMetrics>,
    pub disk: Option<DiskMetrics>,
    pub network: Option<NetworkMetrics>,
    pub uptime_seconds: u64,
    pub active_connections: usize,
    pub timestamp: String,
}

/// Flat per-cycle view consumed by the alert thresholds. `None` is the
/// sentinel for a metric that could not be read this cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SystemSnapshot {
    pub cpu_percent: Option<f32>,
    pub memory_percent: Option<f32>,
    pub disk_percent: Option<f32>,
    pub active_connections: usize,
}

impl SystemMetrics {
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            cpu_percent: self.cpu.map(|c| c.usage_percent),
            memory_percent: self.memory.map(|m| m.usage_percent),
            disk_percent: self.disk.map(|d| d.usage_percent),
            active_connections: self.active_connections,
        }
    }
}

/// Sampler owning persistent sysinfo handles so CPU usage is measured
/// against the previous cycle's refresh.
pub struct MetricsSampler {
    sys: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
}

impl MetricsSampler {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new_all()),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }

    /// Collect one sample. Partial data never blocks the cycle: a failed
    /// sub-reading is logged and reported as `None`.
    pub fn sample(&self, active_connections: usize) -> SystemMetrics {
        let (cpu, memory) = {
            let mut sys = self.sys.lock();
            sys.refresh_cpu_usage();
            sys.refresh_memory();
            (collect_cpu(&sys), collect_memory(&sys))
        };
        let disk = {
            let mut disks = self.disks.lock();
            disks.refresh();
            collect_disk(&disks)
        };
        let network = {
            let mut networks = self.networks.lock();
            networks.refresh();
            collect_network(&networks)
        };

        SystemMetrics {
            cpu: ok_or_none(cpu),
            memory: ok_or_none(memory),
            disk: ok_or_none(disk),
            network: ok_or_none(network),
            uptime_seconds: System::uptime(),
            active_connections,
            timestamp: now_rfc3339(),
        }
    }
}

impl Default for MetricsSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn ok_or_none<T>(reading: Result<T, MonitorError>) -> Option<T> {
    match reading {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{e}");
            None
        }
    }
}

fn collect_cpu(sys: &System) -> Result<CpuMetrics, MonitorError> {
    let core_count = sys.cpus().len();
    if core_count == 0 {
        return Err(MonitorError::SampleFailure("cpu"));
    }
    Ok(CpuMetrics {
        usage_percent: sys.global_cpu_info().cpu_usage(),
        core_count,
    })
}

fn collect_memory(sys: &System) -> Result<MemoryMetrics, MonitorError> {
    let total_bytes = sys.total_memory();
    if total_bytes == 0 {
        return Err(MonitorError::SampleFailure("memory"));
    }
    let used_bytes = total_bytes - sys.available_memory();
    Ok(MemoryMetrics {
        usage_percent: used_bytes as f32 / total_bytes as f32 * 100.0,
        used_gb: to_gb(used_bytes),
        total_gb: to_gb(total_bytes),
    })
}

fn collect_disk(disks: &Disks) -> Result<DiskMetrics, MonitorError> {
    let mut total_bytes = 0u64;
    let mut available_bytes = 0u64;
    for disk in disks.list() {
        total_bytes += disk.total_space();
        available_bytes += disk.available_space();
    }
    if total_bytes == 0 {
        // aucun montage lisible sur cette plateforme
        return Err(MonitorError::SampleFailure("disk"));
    }
    let used_bytes = total_bytes - available_bytes;
    Ok(DiskMetrics {
        usage_percent: used_bytes as f32 / total_bytes as f32 * 100.0,
        used_gb: to_gb(used_bytes),
        total_gb: to_gb(total_bytes),
    })
}

fn collect_network(networks: &Networks) -> Result<NetworkMetrics, MonitorError> {
    let mut bytes_sent = 0u64;
    let mut bytes_recv = 0u64;
    let mut seen = false;
    for (_, data) in networks.list() {
        seen = true;
        bytes_sent += data.total_transmitted();
        bytes_recv += data.total_received();
    }
    if !seen {
        return Err(MonitorError::SampleFailure("network"));
    }
    Ok(NetworkMetrics { bytes_sent, bytes_recv })
}

fn to_gb(bytes: u64) -> f64 {
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    (gb * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_reports_memory_and_uptime() {
        let sampler = MetricsSampler::new();
        let metrics = sampler.sample(0);
        let memory = metrics.memory.expect("memory readable on test hosts");
        assert!(memory.total_gb > 0.0);
        assert!((0.0..=100.0).contains(&memory.usage_percent));
        assert_eq!(metrics.active_connections, 0);
        assert!(!metrics.timestamp.is_empty());
    }

    #[test]
    fn snapshot_projects_the_percentages() {
        let sampler = MetricsSampler::new();
        let metrics = sampler.sample(3);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_connections, 3);
        if let Some(percent) = snapshot.memory_percent {
            assert!((0.0..=100.0).contains(&percent));
        }
        if let Some(percent) = snapshot.disk_percent {
            assert!((0.0..=100.0).contains(&percent));
        }
    }
}
