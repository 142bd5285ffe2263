use std::path::Path;

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use super::{RegistryResult, write_bytes_atomic};

pub const METRICS_FILE_NAME: &str = "metrics.prom";

/// Run counters exported for external monitoring.
///
/// Owns its registry instead of using the process-wide default one.
#[derive(Clone)]
pub struct RunMetrics {
    registry: Registry,
    runs_total: IntCounter,
    failed_runs_total: IntCounter,
    log_lines: IntGauge,
}

impl RunMetrics {
    pub fn new() -> RegistryResult<Self> {
        let registry = Registry::new();
        let runs_total = IntCounter::new("fakelog_runs_total", "Completed generation cycles")?;
        let failed_runs_total = IntCounter::new(
            "fakelog_failed_runs_total",
            "Generation cycles that exhausted their retries",
        )?;
        let log_lines = IntGauge::new(
            "fakelog_log_lines",
            "Synthetic log lines in the latest persisted batch",
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(failed_runs_total.clone()))?;
        registry.register(Box::new(log_lines.clone()))?;

        Ok(Self {
            registry,
            runs_total,
            failed_runs_total,
            log_lines,
        })
    }

    pub fn record_success(&self, log_lines: u64) {
        self.runs_total.inc();
        self.log_lines.set(i64::try_from(log_lines).unwrap_or(i64::MAX));
    }

    pub fn record_failure(&self) {
        self.failed_runs_total.inc();
    }

    #[cfg(test)]
    pub fn runs_total(&self) -> u64 {
        self.runs_total.get()
    }

    #[cfg(test)]
    pub fn failed_runs_total(&self) -> u64 {
        self.failed_runs_total.get()
    }

    #[cfg(test)]
    pub fn log_lines(&self) -> i64 {
        self.log_lines.get()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> RegistryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn write_textfile(&self, path: &Path) -> RegistryResult<()> {
        write_bytes_atomic(path, self.render()?.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_runs_and_tracks_log_lines() {
        let metrics = RunMetrics::new().expect("metrics");
        metrics.record_success(100);
        metrics.record_success(42);
        metrics.record_failure();

        assert_eq!(metrics.runs_total(), 2);
        assert_eq!(metrics.failed_runs_total(), 1);
        assert_eq!(metrics.log_lines(), 42);

        let text = metrics.render().expect("render");
        assert!(text.contains("fakelog_runs_total 2"));
        assert!(text.contains("fakelog_log_lines 42"));
    }

    #[test]
    fn registries_are_independent() {
        let a = RunMetrics::new().expect("metrics a");
        let b = RunMetrics::new().expect("metrics b");
        a.record_success(1);
        assert_eq!(b.runs_total(), 0);
    }
}
