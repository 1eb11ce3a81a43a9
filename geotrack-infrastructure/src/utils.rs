use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::debug;

use geotrack_domain::{StoreConfig, StoreError};

/// Per-call timeout plus bounded retries with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub op_timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            op_timeout: config.op_timeout,
            max_retries: config.max_retries,
            backoff: config.retry_backoff,
        }
    }

    pub fn no_retry(op_timeout: Duration) -> Self {
        Self {
            op_timeout,
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

/// Runs `op` under the policy. Only transient errors are retried; a retried
/// increment whose first attempt timed out after landing counts twice.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut retries = 0;
    loop {
        let result = match timeout(policy.op_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(policy.op_timeout)),
        };
        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && retries < policy.max_retries => {
                retries += 1;
                debug!(
                    "{} failed, retry {}/{}: {}",
                    op_name, retries, policy.max_retries, err
                );
                sleep(policy.backoff * retries).await;
            }
            Err(err) => return Err(err),
        }
    }
}
