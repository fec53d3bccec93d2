use std::thread;
use std::time::Duration;
use sysinfo::System;

/// Lowest share of the machine the pool sizes itself for, however busy it is.
const MIN_IDLE_SHARE: f32 = 0.25;

/// Samples CPU load once at startup to size the encode worker pool.
pub struct CpuMonitor {
    system: System,
}

impl CpuMonitor {
    #[must_use]
    pub fn new() -> Self {
        let mut system = System::new();
        // Usage is a delta between two refreshes
        system.refresh_cpu_all();
        thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL.max(Duration::from_millis(200)));
        system.refresh_cpu_all();
        Self { system }
    }

    #[must_use]
    pub fn logical_cpu_count(&self) -> usize {
        self.system.cpus().len().max(1)
    }

    /// Fraction of CPU time left idle at the last sample, in `[MIN_IDLE_SHARE, 1]`.
    #[must_use]
    pub fn idle_share(&self) -> f32 {
        (1.0 - self.system.global_cpu_usage() / 100.0).clamp(MIN_IDLE_SHARE, 1.0)
    }

    /// One x264 encode per two idle logical CPUs, at least one.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn suggested_workers(&self) -> usize {
        let available = self.logical_cpu_count() as f32 * self.idle_share();
        ((available / 2.0).floor() as usize).clamp(1, self.logical_cpu_count())
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_workers_within_cpu_count() {
        let monitor = CpuMonitor::new();
        let share = monitor.idle_share();
        assert!((MIN_IDLE_SHARE..=1.0).contains(&share));
        assert!(monitor.suggested_workers() >= 1);
        assert!(monitor.suggested_workers() <= monitor.logical_cpu_count());
    }
}
