// Event entity
// A single geolocation ping as delivered by the transport

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventValidationError;
use crate::value_objects::{Coordinates, EventId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEvent {
    pub event_id: EventId,
    pub user_id: UserId,
    pub latitude: f64,
    pub longitude: f64,
    /// Device-reported instant.
    pub timestamp: DateTime<Utc>,
    /// Ingestion instant; filled with the intake time when absent.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl LocationEvent {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.event_id.is_blank() {
            return Err(EventValidationError::EmptyEventId);
        }
        if self.user_id.is_blank() {
            return Err(EventValidationError::EmptyUserId);
        }
        self.coordinates().validate()
    }
}
