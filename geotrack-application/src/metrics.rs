use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    events_processed: AtomicU64,
    anomalies_detected: AtomicU64,
    events_failed: AtomicU64,
    events_rejected: AtomicU64,
    events_dropped: AtomicU64,
    state_degraded: AtomicU64,
    anomaly_log_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_processed: u64,
    pub anomalies_detected: u64,
    pub events_failed: u64,
    pub events_rejected: u64,
    pub events_dropped: u64,
    pub state_degraded: u64,
    pub anomaly_log_failures: u64,
}

impl Metrics {
    pub fn record_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_anomaly(&self) {
        self.anomalies_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.events_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_degraded(&self) {
        self.state_degraded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_anomaly_log_failure(&self) {
        self.anomaly_log_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            anomalies_detected: self.anomalies_detected.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            state_degraded: self.state_degraded.load(Ordering::Relaxed),
            anomaly_log_failures: self.anomaly_log_failures.load(Ordering::Relaxed),
        }
    }

    pub fn render_prometheus(&self) -> String {
        let snapshot = self.snapshot();

        format!(
            "# TYPE geotrack_events_processed_total counter\n\
geotrack_events_processed_total {}\n\
# TYPE geotrack_anomalies_detected_total counter\n\
geotrack_anomalies_detected_total {}\n\
# TYPE geotrack_events_failed_total counter\n\
geotrack_events_failed_total {}\n\
# TYPE geotrack_events_rejected_total counter\n\
geotrack_events_rejected_total {}\n\
# TYPE geotrack_events_dropped_total counter\n\
geotrack_events_dropped_total {}\n\
# TYPE geotrack_state_degraded_total counter\n\
geotrack_state_degraded_total {}\n\
# TYPE geotrack_anomaly_log_failures_total counter\n\
geotrack_anomaly_log_failures_total {}\n",
            snapshot.events_processed,
            snapshot.anomalies_detected,
            snapshot.events_failed,
            snapshot.events_rejected,
            snapshot.events_dropped,
            snapshot.state_degraded,
            snapshot.anomaly_log_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_prometheus_includes_core_counters() {
        let metrics = Metrics::default();
        metrics.record_processed();
        metrics.record_processed();
        metrics.record_anomaly();

        let text = metrics.render_prometheus();
        assert!(text.contains("geotrack_events_processed_total 2\n"));
        assert!(text.contains("geotrack_anomalies_detected_total 1\n"));
        assert!(text.contains("geotrack_events_failed_total 0\n"));
    }
}
