/// Verdict for one event. An event is never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    Normal,
    Anomalous { distance_km: f64 },
}

impl Classification {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Classification::Anomalous { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::Anomalous { .. } => "anomalous",
        }
    }
}
