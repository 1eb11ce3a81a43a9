// Runtime configuration handed to the application layer

use std::time::Duration;

use crate::services::{AnomalyRule, DEFAULT_ANOMALY_THRESHOLD_KM};

pub const DEFAULT_LOCATION_TTL: Duration = Duration::from_secs(60 * 60);

/// What to do with an event whose previous-state read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFetchPolicy {
    /// Treat the failed read as "no previous observation" and keep going.
    #[default]
    Degrade,
    /// Fail the event so the transport redelivers it.
    Fail,
}

impl StateFetchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFetchPolicy::Degrade => "degrade",
            StateFetchPolicy::Fail => "fail",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "degrade" => Some(StateFetchPolicy::Degrade),
            "fail" => Some(StateFetchPolicy::Fail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub anomaly_threshold_km: f64,
    pub max_speed_kmh: Option<f64>,
    pub location_ttl: Duration,
    pub state_fetch_policy: StateFetchPolicy,
    pub workers: usize,
    pub queue_capacity: usize,
    pub max_delivery_attempts: u32,
}

impl RuntimeConfig {
    pub fn anomaly_rule(&self) -> AnomalyRule {
        match self.max_speed_kmh {
            Some(max_speed_kmh) => AnomalyRule::Velocity {
                threshold_km: self.anomaly_threshold_km,
                max_speed_kmh,
            },
            None => AnomalyRule::Distance {
                threshold_km: self.anomaly_threshold_km,
            },
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold_km: DEFAULT_ANOMALY_THRESHOLD_KM,
            max_speed_kmh: None,
            location_ttl: DEFAULT_LOCATION_TTL,
            state_fetch_policy: StateFetchPolicy::Degrade,
            workers: 5,
            queue_capacity: 1024,
            max_delivery_attempts: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub op_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_millis(500),
            max_retries: 2,
            retry_backoff: Duration::from_millis(50),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
