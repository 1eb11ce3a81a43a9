use std::sync::Arc;

use geotrack_domain::ports::{ActivityCounters, AnomalyLog, LocationStateStore};
use geotrack_domain::{AnomalyClassifier, RuntimeConfig};

use crate::Metrics;

/// Handles shared by every worker. Holds no mutable state of its own beyond
/// the atomic metrics; consistency is delegated to the backing stores.
#[derive(Clone)]
pub struct ProcessorState {
    pub config: RuntimeConfig,
    pub location_store: Arc<dyn LocationStateStore>,
    pub activity_counters: Arc<dyn ActivityCounters>,
    pub anomaly_log: Arc<dyn AnomalyLog>,
    pub classifier: AnomalyClassifier,
    pub metrics: Arc<Metrics>,
}

impl ProcessorState {
    pub fn new(
        config: RuntimeConfig,
        location_store: Arc<dyn LocationStateStore>,
        activity_counters: Arc<dyn ActivityCounters>,
        anomaly_log: Arc<dyn AnomalyLog>,
    ) -> Self {
        let classifier = AnomalyClassifier::new(config.anomaly_rule());
        Self {
            config,
            location_store,
            activity_counters,
            anomaly_log,
            classifier,
            metrics: Arc::new(Metrics::default()),
        }
    }
}
