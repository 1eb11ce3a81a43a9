// Last known location entity
// The per-user state the stream processor compares new events against

use chrono::{DateTime, Utc};

use crate::entities::LocationEvent;
use crate::value_objects::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastKnownLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
}

impl LastKnownLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl From<&LocationEvent> for LastKnownLocation {
    fn from(event: &LocationEvent) -> Self {
        Self {
            latitude: event.latitude,
            longitude: event.longitude,
            observed_at: event.timestamp,
        }
    }
}
