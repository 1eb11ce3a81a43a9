//! End-to-end processing against the in-memory store adapters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use geotrack_application::commands::process_event;
use geotrack_application::ops::{delivery_channel, Delivery, WorkerPool};
use geotrack_application::{ProcessingError, ProcessorState};
use geotrack_domain::ports::{KeyValueStore, LocationStateStore};
use geotrack_domain::{
    Classification, EventId, LocationEvent, RuntimeConfig, StateFetchPolicy, StoreError, UserId,
};
use geotrack_infrastructure::{
    KvActivityCounters, KvAnomalyLog, KvLocationStateStore, MemoryKeyValueStore, RetryPolicy,
};

/// Wraps the memory store and fails selected operations on demand.
#[derive(Default)]
struct FaultyStore {
    inner: MemoryKeyValueStore,
    fail_get: AtomicBool,
    fail_increment: AtomicBool,
    fail_append: AtomicBool,
}

fn outage() -> StoreError {
    StoreError::Unavailable("connection reset by peer".to_string())
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        self.inner.set(key, value, ttl).await
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        if self.fail_increment.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.increment(key).await
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.append_to_list(key, value).await
    }
}

fn build_state(store: Arc<dyn KeyValueStore>, config: RuntimeConfig) -> ProcessorState {
    let retry = RetryPolicy::no_retry(Duration::from_millis(200));
    ProcessorState::new(
        config,
        Arc::new(KvLocationStateStore::new(store.clone(), retry)),
        Arc::new(KvActivityCounters::new(store.clone(), retry)),
        Arc::new(KvAnomalyLog::new(store, retry)),
    )
}

fn event(id: &str, user: &str, latitude: f64, longitude: f64) -> LocationEvent {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    LocationEvent {
        event_id: EventId::from(id),
        user_id: UserId::from(user),
        latitude,
        longitude,
        timestamp: at,
        received_at: at,
    }
}

#[tokio::test]
async fn sequential_events_count_exactly_and_keep_last_location() {
    let kv = MemoryKeyValueStore::new();
    let state = build_state(Arc::new(kv.clone()), RuntimeConfig::default());
    let route = [
        (40.7128, -74.0060),
        (40.7228, -74.0160),
        (40.7306, -73.9866),
        (40.7484, -73.9857),
        (40.7580, -73.9855),
    ];

    for (index, (latitude, longitude)) in route.iter().enumerate() {
        let delivered = event(&format!("e{index}"), "alice", *latitude, *longitude);
        let outcome = process_event(&state, &delivered).await.expect("processed");
        assert_eq!(outcome.classification, Classification::Normal);
    }

    assert_eq!(kv.counter("activity:user:alice"), Some(route.len() as i64));
    assert_eq!(kv.counter("activity:global"), Some(route.len() as i64));
    let store = KvLocationStateStore::new(Arc::new(kv.clone()), RetryPolicy::default());
    let last = store
        .get(&UserId::from("alice"))
        .await
        .expect("get")
        .expect("location present");
    assert_eq!((last.latitude, last.longitude), route[route.len() - 1]);
    assert!(kv.list("anomalies:alice").is_empty());
}

#[tokio::test]
async fn new_york_to_london_is_recorded_as_anomaly() {
    let kv = MemoryKeyValueStore::new();
    let state = build_state(Arc::new(kv.clone()), RuntimeConfig::default());

    let first = process_event(&state, &event("e1", "bob", 51.5074, -0.1278))
        .await
        .expect("first");
    assert_eq!(first.classification, Classification::Normal);

    let second = process_event(&state, &event("e2", "bob", 40.7128, -74.0060))
        .await
        .expect("second");
    match second.classification {
        Classification::Anomalous { distance_km } => {
            assert!((distance_km - 5570.0).abs() <= 20.0)
        }
        other => panic!("unexpected classification {other:?}"),
    }
    assert_eq!(kv.list("anomalies:bob"), vec!["e2"]);
    assert_eq!(state.metrics.snapshot().anomalies_detected, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_events_for_one_user_keep_both_increments() {
    let kv = MemoryKeyValueStore::new();
    let state = build_state(Arc::new(kv.clone()), RuntimeConfig::default());
    process_event(&state, &event("seed", "carol", 48.8566, 2.3522))
        .await
        .expect("seed");

    let first = {
        let state = state.clone();
        tokio::spawn(async move {
            process_event(&state, &event("e1", "carol", 48.8600, 2.3500)).await
        })
    };
    let second = {
        let state = state.clone();
        tokio::spawn(async move {
            process_event(&state, &event("e2", "carol", 48.8530, 2.3499)).await
        })
    };
    first.await.expect("join").expect("first processed");
    second.await.expect("join").expect("second processed");

    assert_eq!(kv.counter("activity:user:carol"), Some(3));
    assert_eq!(kv.counter("activity:global"), Some(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_counts_every_delivery_under_concurrency() {
    let kv = MemoryKeyValueStore::new();
    let config = RuntimeConfig {
        workers: 6,
        ..RuntimeConfig::default()
    };
    let state = build_state(Arc::new(kv.clone()), config);
    let (tx, rx) = delivery_channel(32);
    let pool = WorkerPool::spawn(state.clone(), &tx, rx);

    for i in 0..200 {
        let user = format!("user-{}", i % 4);
        let jitter = (i % 10) as f64 * 0.001;
        tx.send(Delivery::new(event(&format!("e{i}"), &user, 10.0 + jitter, 20.0)))
            .await
            .expect("send");
    }
    drop(tx);
    pool.join().await;

    for user in 0..4 {
        assert_eq!(kv.counter(&format!("activity:user:user-{user}")), Some(50));
    }
    assert_eq!(kv.counter("activity:global"), Some(200));
    assert_eq!(state.metrics.snapshot().events_processed, 200);
}

#[tokio::test]
async fn state_store_outage_still_counts_activity() {
    let store = Arc::new(FaultyStore::default());
    let state = build_state(store.clone(), RuntimeConfig::default());
    process_event(&state, &event("e1", "dave", 35.6762, 139.6503))
        .await
        .expect("first");

    store.fail_get.store(true, Ordering::SeqCst);
    let outcome = process_event(&state, &event("e2", "dave", -33.8688, 151.2093))
        .await
        .expect("degraded");

    assert!(outcome.state_read_degraded);
    assert_eq!(outcome.classification, Classification::Normal);
    assert_eq!(store.inner.counter("activity:user:dave"), Some(2));
    assert_eq!(store.inner.counter("activity:global"), Some(2));
}

#[tokio::test]
async fn strict_policy_surfaces_store_unavailable() {
    let store = Arc::new(FaultyStore::default());
    let config = RuntimeConfig {
        state_fetch_policy: StateFetchPolicy::Fail,
        ..RuntimeConfig::default()
    };
    let state = build_state(store.clone(), config);
    store.fail_get.store(true, Ordering::SeqCst);

    let err = process_event(&state, &event("e1", "erin", 1.0, 1.0))
        .await
        .expect_err("strict");
    assert!(matches!(err, ProcessingError::StoreUnavailable(_)));
    assert_eq!(store.inner.counter("activity:user:erin"), None);
}

#[tokio::test]
async fn anomaly_append_failure_keeps_anomaly_metric() {
    let store = Arc::new(FaultyStore::default());
    let state = build_state(store.clone(), RuntimeConfig::default());
    process_event(&state, &event("e1", "frank", 40.7128, -74.0060))
        .await
        .expect("first");

    store.fail_append.store(true, Ordering::SeqCst);
    let outcome = process_event(&state, &event("e2", "frank", 51.5074, -0.1278))
        .await
        .expect("processed");

    assert!(outcome.classification.is_anomalous());
    assert!(!outcome.anomaly_logged);
    assert!(store.inner.list("anomalies:frank").is_empty());
    let snapshot = state.metrics.snapshot();
    assert_eq!(snapshot.anomalies_detected, 1);
    assert_eq!(snapshot.anomaly_log_failures, 1);
    assert_eq!(store.inner.counter("activity:user:frank"), Some(2));
}

#[tokio::test]
async fn counter_outage_fails_event_for_redelivery() {
    let store = Arc::new(FaultyStore::default());
    let state = build_state(store.clone(), RuntimeConfig::default());
    store.fail_increment.store(true, Ordering::SeqCst);

    let err = process_event(&state, &event("e1", "gina", 1.0, 1.0))
        .await
        .expect_err("counter outage");
    assert!(matches!(err, ProcessingError::CounterUpdateFailed(_)));

    store.fail_increment.store(false, Ordering::SeqCst);
    process_event(&state, &event("e1", "gina", 1.0, 1.0))
        .await
        .expect("redelivery succeeds");
    assert_eq!(store.inner.counter("activity:user:gina"), Some(1));
}

#[tokio::test]
async fn corrupted_state_is_treated_as_missing_baseline() {
    let kv = MemoryKeyValueStore::new();
    kv.set("location:hank", b"garbage".to_vec(), Duration::from_secs(60))
        .await
        .expect("seed garbage");
    let state = build_state(Arc::new(kv.clone()), RuntimeConfig::default());

    let outcome = process_event(&state, &event("e1", "hank", 51.5074, -0.1278))
        .await
        .expect("processed");
    assert!(outcome.state_read_degraded);
    assert_eq!(outcome.classification, Classification::Normal);

    let store = KvLocationStateStore::new(Arc::new(kv), RetryPolicy::default());
    let repaired = store.get(&UserId::from("hank")).await.expect("readable again");
    assert!(repaired.is_some());
}

#[tokio::test(start_paused = true)]
async fn expired_state_means_no_anomaly() {
    let kv = MemoryKeyValueStore::new();
    let state = build_state(Arc::new(kv.clone()), RuntimeConfig::default());
    process_event(&state, &event("e1", "ivy", 40.7128, -74.0060))
        .await
        .expect("first");

    tokio::time::advance(Duration::from_secs(3601)).await;
    let outcome = process_event(&state, &event("e2", "ivy", 51.5074, -0.1278))
        .await
        .expect("second");
    assert_eq!(outcome.classification, Classification::Normal);
}
