use std::sync::Arc;

use async_trait::async_trait;

use geotrack_domain::ports::{ActivityCounters, KeyValueStore};
use geotrack_domain::{StoreError, UserId};

use crate::repositories::keys::{user_activity_key, GLOBAL_ACTIVITY_KEY};
use crate::utils::{with_retry, RetryPolicy};

/// Counters live in the shared store and rely on its atomic increment.
pub struct KvActivityCounters {
    store: Arc<dyn KeyValueStore>,
    retry: RetryPolicy,
}

impl KvActivityCounters {
    pub fn new(store: Arc<dyn KeyValueStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }
}

#[async_trait]
impl ActivityCounters for KvActivityCounters {
    async fn increment_user(&self, user_id: &UserId) -> Result<i64, StoreError> {
        let key = user_activity_key(user_id);
        with_retry(&self.retry, "user counter increment", || {
            self.store.increment(&key)
        })
        .await
    }

    async fn increment_global(&self) -> Result<i64, StoreError> {
        with_retry(&self.retry, "global counter increment", || {
            self.store.increment(GLOBAL_ACTIVITY_KEY)
        })
        .await
    }
}
