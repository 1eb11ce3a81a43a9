use tracing::{debug, error, info, warn};

use geotrack_domain::{
    Classification, LastKnownLocation, LocationEvent, StateFetchPolicy, StoreError, UserId,
};

use crate::{ProcessingError, ProcessingStage, ProcessorState};

/// What happened to an event that completed processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventOutcome {
    pub classification: Classification,
    /// Previous state could not be read; classified as a first observation.
    pub state_read_degraded: bool,
    /// New state could not be written; the next event sees stale state.
    pub state_write_failed: bool,
    /// Anomaly landed in the audit log. Always false for normal events.
    pub anomaly_logged: bool,
}

impl EventOutcome {
    pub fn log_stage(&self) -> ProcessingStage {
        if self.anomaly_logged {
            ProcessingStage::Logged
        } else {
            ProcessingStage::SkippedLog
        }
    }
}

/// Runs one delivered event through fetch, update, classify, log and count.
///
/// Concurrent calls for the same user are not serialized: both may classify
/// against the same pre-update state, and the location writes race with
/// last-write-wins by arrival order. Counter increments never race because
/// they are atomic in the store.
pub async fn process_event(
    state: &ProcessorState,
    event: &LocationEvent,
) -> Result<EventOutcome, ProcessingError> {
    if let Err(err) = event.validate() {
        warn!("rejecting event {}: {}", event.event_id, err);
        state.metrics.record_rejected();
        return Err(ProcessingError::InvalidEvent(err));
    }

    let (previous, state_read_degraded) = match state.location_store.get(&event.user_id).await {
        Ok(previous) => (previous, false),
        Err(err) => match state.config.state_fetch_policy {
            StateFetchPolicy::Degrade => {
                warn!(
                    "state fetch failed for user {} (event {}), classifying without baseline: {}",
                    event.user_id, event.event_id, err
                );
                state.metrics.record_state_degraded();
                (None, true)
            }
            StateFetchPolicy::Fail => {
                warn!(
                    "state fetch failed for user {} (event {}), failing event: {}",
                    event.user_id, event.event_id, err
                );
                state.metrics.record_failed();
                return Err(ProcessingError::StoreUnavailable(err));
            }
        },
    };
    debug!("event {} {}", event.event_id, ProcessingStage::StateFetched.as_str());

    let current = LastKnownLocation::from(event);
    let state_write_failed = match state
        .location_store
        .put(&event.user_id, &current, state.config.location_ttl)
        .await
    {
        Ok(()) => false,
        Err(err) => {
            warn!(
                "state write failed for user {} (event {}): {}",
                event.user_id, event.event_id, err
            );
            state.metrics.record_state_degraded();
            true
        }
    };
    debug!("event {} {}", event.event_id, ProcessingStage::StateUpdated.as_str());

    let classification = state.classifier.classify(previous.as_ref(), event);
    debug!(
        "event {} {} as {}",
        event.event_id,
        ProcessingStage::Classified.as_str(),
        classification.as_str()
    );

    let mut anomaly_logged = false;
    if let Classification::Anomalous { distance_km } = classification {
        state.metrics.record_anomaly();
        info!(
            "anomaly detected: user={}, event={}, distance_km={:.1}",
            event.user_id, event.event_id, distance_km
        );
        match state.anomaly_log.append(&event.user_id, &event.event_id).await {
            Ok(()) => anomaly_logged = true,
            Err(err) => {
                warn!(
                    "anomaly log append failed for user {} (event {}): {}",
                    event.user_id, event.event_id, err
                );
                state.metrics.record_anomaly_log_failure();
            }
        }
    }

    if let Err(err) = increment_counters(state, &event.user_id).await {
        error!(
            "activity counters unavailable for user {} (event {}): {}",
            event.user_id, event.event_id, err
        );
        state.metrics.record_failed();
        return Err(ProcessingError::CounterUpdateFailed(err));
    }
    debug!("event {} {}", event.event_id, ProcessingStage::CountersUpdated.as_str());

    state.metrics.record_processed();
    debug!("event {} {}", event.event_id, ProcessingStage::Done.as_str());
    Ok(EventOutcome {
        classification,
        state_read_degraded,
        state_write_failed,
        anomaly_logged,
    })
}

/// Terminal stage of a processed delivery.
pub fn final_stage(result: &Result<EventOutcome, ProcessingError>) -> ProcessingStage {
    match result {
        Ok(_) => ProcessingStage::Done,
        Err(_) => ProcessingStage::Failed,
    }
}

/// Not transactional. If the global increment fails after the user increment
/// landed, the event is redelivered and the user counter is bumped again
/// (at-least-once counting).
async fn increment_counters(state: &ProcessorState, user_id: &UserId) -> Result<(), StoreError> {
    state.activity_counters.increment_user(user_id).await?;
    state.activity_counters.increment_global().await?;
    Ok(())
}
