use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use geotrack_domain::LocationEvent;

use crate::commands::{final_stage, process_event, EventOutcome};
use crate::{ProcessingError, ProcessorState};

/// One delivery of an event from the transport. `attempt` starts at 1.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub event: LocationEvent,
    pub attempt: u32,
}

impl Delivery {
    pub fn new(event: LocationEvent) -> Self {
        Self { event, attempt: 1 }
    }
}

/// Acknowledgement decision for a finished delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Reject,
    Redeliver,
    Drop,
}

pub fn disposition(
    result: &Result<EventOutcome, ProcessingError>,
    attempt: u32,
    max_attempts: u32,
) -> Disposition {
    match result {
        Ok(_) => Disposition::Ack,
        Err(err) if !err.is_retryable() => Disposition::Reject,
        Err(_) if attempt < max_attempts => Disposition::Redeliver,
        Err(_) => Disposition::Drop,
    }
}

pub fn delivery_channel(capacity: usize) -> (mpsc::Sender<Delivery>, mpsc::Receiver<Delivery>) {
    mpsc::channel(capacity.max(1))
}

/// Fixed set of workers pulling deliveries from one shared queue.
///
/// Failed deliveries are put back on the queue through a weak sender so the
/// queue still closes once the intake drops its sender. When the queue is
/// closed or full the worker redelivers in place.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        state: ProcessorState,
        sender: &mpsc::Sender<Delivery>,
        receiver: mpsc::Receiver<Delivery>,
    ) -> Self {
        let workers = state.config.workers.max(1);
        let receiver = Arc::new(Mutex::new(receiver));
        let handles = (0..workers)
            .map(|worker_id| {
                let worker = Worker {
                    id: worker_id,
                    state: state.clone(),
                    receiver: receiver.clone(),
                    requeue_tx: sender.downgrade(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        info!("worker pool started: workers={}", workers);
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits until the queue is closed and drained.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!("worker task ended abnormally: {}", err);
            }
        }
    }
}

struct Worker {
    id: usize,
    state: ProcessorState,
    receiver: Arc<Mutex<mpsc::Receiver<Delivery>>>,
    requeue_tx: mpsc::WeakSender<Delivery>,
}

impl Worker {
    async fn run(self) {
        loop {
            let next = { self.receiver.lock().await.recv().await };
            let Some(delivery) = next else {
                break;
            };
            self.handle(delivery).await;
        }
        debug!("worker {} stopped", self.id);
    }

    async fn handle(&self, mut delivery: Delivery) {
        let max_attempts = self.state.config.max_delivery_attempts.max(1);
        loop {
            let result = process_event(&self.state, &delivery.event).await;
            debug!(
                "worker {}: event {} {} on attempt {}",
                self.id,
                delivery.event.event_id,
                final_stage(&result).as_str(),
                delivery.attempt
            );
            match disposition(&result, delivery.attempt, max_attempts) {
                Disposition::Ack | Disposition::Reject => return,
                Disposition::Drop => {
                    if let Err(err) = result {
                        error!(
                            "dropping event {} after {} attempts (failed after {}): {}",
                            delivery.event.event_id,
                            delivery.attempt,
                            err.failed_after().as_str(),
                            err
                        );
                    }
                    self.state.metrics.record_dropped();
                    return;
                }
                Disposition::Redeliver => {
                    delivery.attempt += 1;
                    warn!(
                        "redelivering event {} (attempt {}/{})",
                        delivery.event.event_id, delivery.attempt, max_attempts
                    );
                    match self.requeue(delivery) {
                        None => return,
                        Some(returned) => delivery = returned,
                    }
                }
            }
        }
    }

    /// Hands the delivery back to the queue, or returns it if that is not possible.
    fn requeue(&self, delivery: Delivery) -> Option<Delivery> {
        let Some(sender) = self.requeue_tx.upgrade() else {
            return Some(delivery);
        };
        match sender.try_send(delivery) {
            Ok(()) => None,
            Err(TrySendError::Full(delivery)) | Err(TrySendError::Closed(delivery)) => {
                Some(delivery)
            }
        }
    }
}
