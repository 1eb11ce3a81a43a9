// Anomaly classifier
// Compares a new observation against the user's last known location

use crate::entities::{Classification, LastKnownLocation, LocationEvent};

pub const DEFAULT_ANOMALY_THRESHOLD_KM: f64 = 100.0;

/// Decision rule applied once a previous observation exists.
///
/// `Distance` is the baseline: it ignores elapsed time, so a flight and a GPS
/// glitch covering the same ground are classified identically. `Velocity`
/// additionally requires the implied speed to exceed `max_speed_kmh`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnomalyRule {
    Distance {
        threshold_km: f64,
    },
    Velocity {
        threshold_km: f64,
        max_speed_kmh: f64,
    },
}

impl AnomalyRule {
    pub fn threshold_km(&self) -> f64 {
        match self {
            AnomalyRule::Distance { threshold_km } => *threshold_km,
            AnomalyRule::Velocity { threshold_km, .. } => *threshold_km,
        }
    }
}

impl Default for AnomalyRule {
    fn default() -> Self {
        AnomalyRule::Distance {
            threshold_km: DEFAULT_ANOMALY_THRESHOLD_KM,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyClassifier {
    rule: AnomalyRule,
}

impl AnomalyClassifier {
    pub fn new(rule: AnomalyRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> AnomalyRule {
        self.rule
    }

    pub fn classify(
        &self,
        previous: Option<&LastKnownLocation>,
        current: &LocationEvent,
    ) -> Classification {
        let Some(previous) = previous else {
            return Classification::Normal;
        };

        let distance_km = previous.coordinates().distance_km_to(&current.coordinates());
        if distance_km <= self.rule.threshold_km() {
            return Classification::Normal;
        }

        match self.rule {
            AnomalyRule::Distance { .. } => Classification::Anomalous { distance_km },
            AnomalyRule::Velocity { max_speed_kmh, .. } => {
                let elapsed_ms = (current.timestamp - previous.observed_at).num_milliseconds();
                if elapsed_ms <= 0 {
                    return Classification::Anomalous { distance_km };
                }
                let elapsed_hours = elapsed_ms as f64 / 3_600_000.0;
                if distance_km / elapsed_hours > max_speed_kmh {
                    Classification::Anomalous { distance_km }
                } else {
                    Classification::Normal
                }
            }
        }
    }
}
