use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Timing and outcome statistics for one batch scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    pub total_hosts: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    /// Wall-clock span of the whole batch
    pub total_duration: Duration,
    pub average_duration: Duration,
    pub fastest_duration: Duration,
    pub slowest_duration: Duration,
}

impl BatchStats {
    /// Percentage of hosts scanned without error, 0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.total_hosts == 0 {
            return 0.0;
        }
        self.successful_count as f64 / self.total_hosts as f64 * 100.0
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanned {} hosts: {} successful, {} failed ({:.1}% success rate) in {:?}",
            self.total_hosts,
            self.successful_count,
            self.failed_count,
            self.success_rate(),
            self.total_duration
        )
    }
}
