use std::future::Future;
use std::time::Duration;
use rand::Rng;
use tracing::warn;

use crate::cache::TtlCache;
use crate::error::Result;

/// Retry bounds for outbound calls. The delay before attempt `n`
/// (counting failures from 0) is `base_delay * 2^n` plus up to 100 ms of
/// jitter so synchronized clients don't retry in lockstep.
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or
/// exhausts the attempt budget. Only transient failures (timeouts,
/// connection failures, upstream-service errors) are retried.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.is_transient() || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let backoff = policy.base_delay * 2u32.pow(attempt - 1);
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..100));
                warn!(
                    attempt,
                    max = policy.max_attempts,
                    delay_ms = (backoff + jitter).as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(backoff + jitter).await;
            }
        }
    }
}

/// The resilience pipeline around an outbound call, in fixed order:
/// cache check (a hit short-circuits everything), then validation, then
/// the retry-wrapped call. Timeout translation happens inside `op` at
/// the reqwest call sites. Successful results are memoized.
pub async fn resilient<V, F, Fut>(
    cache: &TtlCache<V>,
    key: &str,
    validation: Result<()>,
    policy: &RetryPolicy,
    op: F,
) -> Result<V>
where
    V: Clone,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    if let Some(hit) = cache.get(key) {
        return Ok(hit);
    }
    validation?;
    let value = with_retry(policy, op).await?;
    cache.insert(key.to_string(), value.clone());
    Ok(value)
}
