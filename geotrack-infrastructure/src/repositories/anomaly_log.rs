use std::sync::Arc;

use async_trait::async_trait;

use geotrack_domain::ports::{AnomalyLog, KeyValueStore};
use geotrack_domain::{EventId, StoreError, UserId};

use crate::repositories::keys::anomalies_key;
use crate::utils::{with_retry, RetryPolicy};

/// Append-only audit trail of anomalous event ids per user.
pub struct KvAnomalyLog {
    store: Arc<dyn KeyValueStore>,
    retry: RetryPolicy,
}

impl KvAnomalyLog {
    pub fn new(store: Arc<dyn KeyValueStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }
}

#[async_trait]
impl AnomalyLog for KvAnomalyLog {
    async fn append(&self, user_id: &UserId, event_id: &EventId) -> Result<(), StoreError> {
        let key = anomalies_key(user_id);
        with_retry(&self.retry, "anomaly append", || {
            self.store.append_to_list(&key, event_id.as_str())
        })
        .await
    }
}
