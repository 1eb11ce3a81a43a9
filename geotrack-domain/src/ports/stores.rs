use std::time::Duration;

use async_trait::async_trait;

use crate::entities::LastKnownLocation;
use crate::error::StoreError;
use crate::value_objects::{EventId, UserId};

/// Byte-oriented key-value cache shared by all workers.
///
/// `increment` must be atomic in the backing store; callers hold no locks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;
    async fn append_to_list(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LocationStateStore: Send + Sync {
    /// Unknown and expired users both yield `Ok(None)`.
    async fn get(&self, user_id: &UserId) -> Result<Option<LastKnownLocation>, StoreError>;
    /// Unconditional overwrite; restarts the expiry window.
    async fn put(
        &self,
        user_id: &UserId,
        location: &LastKnownLocation,
        ttl: Duration,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ActivityCounters: Send + Sync {
    async fn increment_user(&self, user_id: &UserId) -> Result<i64, StoreError>;
    async fn increment_global(&self) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait AnomalyLog: Send + Sync {
    async fn append(&self, user_id: &UserId, event_id: &EventId) -> Result<(), StoreError>;
}
