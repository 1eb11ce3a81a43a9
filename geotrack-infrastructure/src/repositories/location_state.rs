use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use geotrack_domain::ports::{KeyValueStore, LocationStateStore};
use geotrack_domain::{LastKnownLocation, StoreError, UserId};

use crate::repositories::keys::location_key;
use crate::repositories::location_codec;
use crate::utils::{with_retry, RetryPolicy};

pub struct KvLocationStateStore {
    store: Arc<dyn KeyValueStore>,
    retry: RetryPolicy,
}

impl KvLocationStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }
}

#[async_trait]
impl LocationStateStore for KvLocationStateStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<LastKnownLocation>, StoreError> {
        let key = location_key(user_id);
        let raw = with_retry(&self.retry, "location get", || self.store.get(&key)).await?;
        raw.map(|bytes| location_codec::decode(&bytes)).transpose()
    }

    async fn put(
        &self,
        user_id: &UserId,
        location: &LastKnownLocation,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = location_key(user_id);
        let bytes = location_codec::encode(location);
        with_retry(&self.retry, "location put", || {
            self.store.set(&key, bytes.clone(), ttl)
        })
        .await
    }
}
