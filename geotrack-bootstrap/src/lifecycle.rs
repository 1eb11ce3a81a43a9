use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use geotrack_application::ops::{delivery_channel, Delivery, WorkerPool};
use geotrack_application::{Metrics, MetricsSnapshot};
use geotrack_infrastructure::AppConfig;

use crate::context::AppContext;
use crate::intake::{open_input, run_jsonl_intake, run_ws_intake};

enum IntakeSource {
    Lines(String),
    WebSocket(String),
}

impl IntakeSource {
    fn from_config(config: &AppConfig) -> Result<Self> {
        if let Some(path) = &config.input_path {
            return Ok(IntakeSource::Lines(path.clone()));
        }
        if let Some(url) = &config.ws_url {
            return Ok(IntakeSource::WebSocket(url.clone()));
        }
        Err(anyhow!(
            "no event intake configured: set input_path or ws_url (or --input / --ws-url)"
        ))
    }
}

/// Runs until the intake is exhausted or a shutdown signal arrives, then
/// drains the queue and returns the final metrics. An intake failure is
/// returned after the queue has drained.
pub async fn run(config: AppConfig) -> Result<MetricsSnapshot> {
    let source = IntakeSource::from_config(&config)?;
    let metrics_interval = Duration::from_secs(config.metrics_interval_seconds);
    let context = AppContext::new(config);
    let state = context.state.clone();
    let metrics = state.metrics.clone();

    let sweeper = context
        .store
        .spawn_sweeper(context.store_config.sweep_interval);
    let reporter = spawn_metrics_reporter(metrics.clone(), metrics_interval);

    let (sender, receiver) = delivery_channel(state.config.queue_capacity);
    let pool = WorkerPool::spawn(state, &sender, receiver);

    let intake_result = tokio::select! {
        result = run_intake(source, sender, metrics.clone()) => {
            match &result {
                Ok(()) => info!("intake finished, draining queue"),
                Err(err) => warn!("intake failed, draining queue: {}", err),
            }
            result
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining queue");
            Ok(())
        }
    };

    pool.join().await;
    if let Some(reporter) = reporter {
        reporter.abort();
    }
    sweeper.abort();

    let snapshot = metrics.snapshot();
    log_snapshot("final metrics", &snapshot);
    debug!("final metrics exposition:\n{}", metrics.render_prometheus());
    intake_result.map(|()| snapshot)
}

async fn run_intake(
    source: IntakeSource,
    sender: mpsc::Sender<Delivery>,
    metrics: Arc<Metrics>,
) -> Result<()> {
    match source {
        IntakeSource::Lines(path) => {
            info!("reading events from {}", path);
            let reader = open_input(&path).await?;
            run_jsonl_intake(reader, sender, &metrics).await?;
            Ok(())
        }
        IntakeSource::WebSocket(url) => run_ws_intake(&url, sender, &metrics).await,
    }
}

fn spawn_metrics_reporter(metrics: Arc<Metrics>, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            log_snapshot("metrics", &metrics.snapshot());
        }
    }))
}

fn log_snapshot(label: &str, snapshot: &MetricsSnapshot) {
    info!(
        "{}: processed={}, anomalies={}, failed={}, rejected={}, dropped={}, state_degraded={}, anomaly_log_failures={}",
        label,
        snapshot.events_processed,
        snapshot.anomalies_detected,
        snapshot.events_failed,
        snapshot.events_rejected,
        snapshot.events_dropped,
        snapshot.state_degraded,
        snapshot.anomaly_log_failures
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("sigterm handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
