use std::time::Duration;

use thiserror::Error;

/// Failure of a backing-store operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed stored value: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Transient failures may succeed on retry; malformed data never will.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventValidationError {
    #[error("event id is empty")]
    EmptyEventId,
    #[error("user id is empty")]
    EmptyUserId,
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}
