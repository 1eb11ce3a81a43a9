use geotrack_domain::{EventValidationError, StoreError};
use thiserror::Error;

/// Per-event state machine. `Failed` is reachable from any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Received,
    StateFetched,
    StateUpdated,
    Classified,
    Logged,
    SkippedLog,
    CountersUpdated,
    Done,
    Failed,
}

impl ProcessingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::Received => "received",
            ProcessingStage::StateFetched => "state_fetched",
            ProcessingStage::StateUpdated => "state_updated",
            ProcessingStage::Classified => "classified",
            ProcessingStage::Logged => "logged",
            ProcessingStage::SkippedLog => "skipped_log",
            ProcessingStage::CountersUpdated => "counters_updated",
            ProcessingStage::Done => "done",
            ProcessingStage::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    #[error("state store unavailable: {0}")]
    StoreUnavailable(StoreError),
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] EventValidationError),
    #[error("activity counter update failed: {0}")]
    CounterUpdateFailed(StoreError),
}

impl ProcessingError {
    /// Last stage the event reached before moving to `Failed`.
    pub fn failed_after(&self) -> ProcessingStage {
        match self {
            ProcessingError::InvalidEvent(_) | ProcessingError::StoreUnavailable(_) => {
                ProcessingStage::Received
            }
            ProcessingError::CounterUpdateFailed(_) => ProcessingStage::Classified,
        }
    }

    /// Whether the transport should redeliver the event.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProcessingError::InvalidEvent(_))
    }
}
