//! In-process key-value store with per-key expiry.
//!
//! Stands in for an external cache: values are opaque bytes, counters are
//! incremented under the shard lock so concurrent callers never lose updates,
//! and lists only grow. Expired keys are dropped lazily on access and by the
//! background sweeper.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use geotrack_domain::ports::KeyValueStore;
use geotrack_domain::StoreError;

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    Counter(i64),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a list; empty when the key is absent, expired or not a list.
    pub fn list(&self, key: &str) -> Vec<String> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                Value::List(items) => items.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub fn counter(&self, key: &str) -> Option<i64> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            return None;
        }
        match &entry.value {
            Value::Counter(value) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired key and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every.max(Duration::from_millis(10)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    debug!("kv sweeper removed {} expired keys", removed);
                }
            }
        })
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = Instant::now();
        let found = match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_expired(now) => None,
            Some(entry) => Some(entry.value.clone()),
        };
        match found {
            None => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                Ok(None)
            }
            Some(Value::Bytes(bytes)) => Ok(Some(bytes)),
            Some(Value::Counter(value)) => Ok(Some(value.to_string().into_bytes())),
            Some(Value::List(_)) => Err(StoreError::Malformed(format!(
                "key {} holds a list, not a value",
                key
            ))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            value: Value::Bytes(value),
            expires_at: Some(Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::persistent(Value::Counter(1)));
                Ok(1)
            }
            MapEntry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.is_expired(now) {
                    *entry = Entry::persistent(Value::Counter(1));
                    return Ok(1);
                }
                let next = match &entry.value {
                    Value::Counter(value) => value + 1,
                    Value::Bytes(bytes) => parse_counter(key, bytes)? + 1,
                    Value::List(_) => {
                        return Err(StoreError::Malformed(format!(
                            "key {} holds a list, not a counter",
                            key
                        )))
                    }
                };
                entry.value = Value::Counter(next);
                Ok(next)
            }
        }
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::persistent(Value::List(Vec::new())));
        if entry.is_expired(now) {
            *entry = Entry::persistent(Value::List(Vec::new()));
        }
        match &mut entry.value {
            Value::List(items) => {
                items.push(value.to_string());
                Ok(())
            }
            _ => Err(StoreError::Malformed(format!(
                "key {} does not hold a list",
                key
            ))),
        }
    }
}

fn parse_counter(key: &str, bytes: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.trim().parse::<i64>().ok())
        .ok_or_else(|| StoreError::Malformed(format!("key {} is not an integer", key)))
}
