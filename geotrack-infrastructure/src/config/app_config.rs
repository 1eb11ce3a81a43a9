use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;

use geotrack_domain::{RuntimeConfig, StateFetchPolicy, StoreConfig, DEFAULT_ANOMALY_THRESHOLD_KM};

use super::validation::{validate_log_format, validate_positive_finite, MAX_WORKERS};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub anomaly_threshold_km: f64,
    pub location_ttl_seconds: u64,
    pub state_fetch_policy: String,
    pub max_speed_kmh: Option<f64>,
    pub workers: usize,
    pub queue_capacity: usize,
    pub max_delivery_attempts: u32,
    pub store_timeout_ms: u64,
    pub store_max_retries: u32,
    pub store_retry_backoff_ms: u64,
    pub sweep_interval_seconds: u64,
    pub metrics_interval_seconds: u64,
    pub input_path: Option<String>,
    pub ws_url: Option<String>,
    pub log_format: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold_km: DEFAULT_ANOMALY_THRESHOLD_KM,
            location_ttl_seconds: 60 * 60,
            state_fetch_policy: StateFetchPolicy::Degrade.as_str().to_string(),
            max_speed_kmh: None,
            workers: 5,
            queue_capacity: 1024,
            max_delivery_attempts: 3,
            store_timeout_ms: 500,
            store_max_retries: 2,
            store_retry_backoff_ms: 50,
            sweep_interval_seconds: 60,
            metrics_interval_seconds: 30,
            input_path: None,
            ws_url: None,
            log_format: "text".to_string(),
            log_dir: None,
        }
    }
}

/// Where the loaded configuration came from. Reported by the caller once
/// logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    /// The file was missing; built-in defaults plus env overrides apply.
    Defaults(String),
}

impl AppConfig {
    pub async fn load() -> Result<(Self, ConfigSource)> {
        let path = env::var("GEOTRACK_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<(Self, ConfigSource)> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let (mut config, source) = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            (Self::from_toml(&content)?, ConfigSource::File(path.to_string()))
        } else {
            (AppConfig::default(), ConfigSource::Defaults(path.to_string()))
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok((config, source))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        if let Some(input_path) = &self.input_path {
            if input_path.trim().is_empty() {
                self.input_path = None;
            }
        }
        if let Some(ws_url) = &self.ws_url {
            if ws_url.trim().is_empty() {
                self.ws_url = None;
            }
        }
        if let Some(log_dir) = &self.log_dir {
            if log_dir.trim().is_empty() {
                self.log_dir = None;
            }
        }
        self.state_fetch_policy = self.state_fetch_policy.trim().to_lowercase();
        self.log_format = self.log_format.trim().to_lowercase();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(input_path) = &self.input_path {
            if input_path.trim() != "-" {
                self.input_path = Some(resolve_path(base, input_path));
            }
        }
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_positive_finite("anomaly_threshold_km", self.anomaly_threshold_km)?;
        if let Some(max_speed) = self.max_speed_kmh {
            validate_positive_finite("max_speed_kmh", max_speed)?;
        }
        if self.location_ttl_seconds == 0 {
            return Err(anyhow!("location_ttl_seconds must be greater than 0"));
        }
        if StateFetchPolicy::parse(&self.state_fetch_policy).is_none() {
            return Err(anyhow!(
                "state_fetch_policy must be \"degrade\" or \"fail\", got {:?}",
                self.state_fetch_policy
            ));
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(anyhow!("workers must be between 1 and {}", MAX_WORKERS));
        }
        if self.queue_capacity == 0 {
            return Err(anyhow!("queue_capacity must be greater than 0"));
        }
        if self.max_delivery_attempts == 0 {
            return Err(anyhow!("max_delivery_attempts must be greater than 0"));
        }
        if self.store_timeout_ms == 0 {
            return Err(anyhow!("store_timeout_ms must be greater than 0"));
        }
        validate_log_format(&self.log_format)?;
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            anomaly_threshold_km: self.anomaly_threshold_km,
            max_speed_kmh: self.max_speed_kmh,
            location_ttl: Duration::from_secs(self.location_ttl_seconds),
            state_fetch_policy: StateFetchPolicy::parse(&self.state_fetch_policy)
                .unwrap_or_default(),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            max_delivery_attempts: self.max_delivery_attempts,
        }
    }

    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            op_timeout: Duration::from_millis(self.store_timeout_ms),
            max_retries: self.store_max_retries,
            retry_backoff: Duration::from_millis(self.store_retry_backoff_ms),
            sweep_interval: Duration::from_secs(self.sweep_interval_seconds),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("GEOTRACK_ANOMALY_THRESHOLD_KM") {
            self.anomaly_threshold_km = value.parse().unwrap_or(self.anomaly_threshold_km);
        }
        if let Ok(value) = env::var("GEOTRACK_LOCATION_TTL_SECONDS") {
            self.location_ttl_seconds = value.parse().unwrap_or(self.location_ttl_seconds);
        }
        if let Ok(value) = env::var("GEOTRACK_STATE_FETCH_POLICY") {
            self.state_fetch_policy = value;
        }
        if let Ok(value) = env::var("GEOTRACK_MAX_SPEED_KMH") {
            self.max_speed_kmh = value.parse().ok();
        }
        if let Ok(value) = env::var("GEOTRACK_WORKERS") {
            self.workers = value.parse().unwrap_or(self.workers);
        }
        if let Ok(value) = env::var("GEOTRACK_QUEUE_CAPACITY") {
            self.queue_capacity = value.parse().unwrap_or(self.queue_capacity);
        }
        if let Ok(value) = env::var("GEOTRACK_MAX_DELIVERY_ATTEMPTS") {
            self.max_delivery_attempts = value.parse().unwrap_or(self.max_delivery_attempts);
        }
        if let Ok(value) = env::var("GEOTRACK_STORE_TIMEOUT_MS") {
            self.store_timeout_ms = value.parse().unwrap_or(self.store_timeout_ms);
        }
        if let Ok(value) = env::var("GEOTRACK_STORE_MAX_RETRIES") {
            self.store_max_retries = value.parse().unwrap_or(self.store_max_retries);
        }
        if let Ok(value) = env::var("GEOTRACK_STORE_RETRY_BACKOFF_MS") {
            self.store_retry_backoff_ms = value.parse().unwrap_or(self.store_retry_backoff_ms);
        }
        if let Ok(value) = env::var("GEOTRACK_SWEEP_INTERVAL_SECONDS") {
            self.sweep_interval_seconds = value.parse().unwrap_or(self.sweep_interval_seconds);
        }
        if let Ok(value) = env::var("GEOTRACK_METRICS_INTERVAL_SECONDS") {
            self.metrics_interval_seconds =
                value.parse().unwrap_or(self.metrics_interval_seconds);
        }
        if let Ok(value) = env::var("GEOTRACK_INPUT_PATH") {
            self.input_path = Some(value);
        }
        if let Ok(value) = env::var("GEOTRACK_WS_URL") {
            self.ws_url = Some(value);
        }
        if let Ok(value) = env::var("GEOTRACK_LOG_FORMAT") {
            self.log_format = value;
        }
        if let Ok(value) = env::var("GEOTRACK_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
