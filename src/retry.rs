//! Rate-limited, pooled execution with bounded linear-backoff retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;
use crate::metrics::MetricsCollector;
use crate::pool::ResourcePool;

/// Attempt bounds and timing for one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    /// Backoff unit; the wait after attempt `n` is `n * retry_delay`.
    pub retry_delay: Duration,
    /// Per-attempt timeout.
    pub operation_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            operation_timeout: config.operation_timeout(),
        }
    }

    /// Delay inserted after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

/// Runs caller operations against pooled clients.
///
/// Every call is checked against the rate limiter before the pool is
/// touched. Each attempt checks out a client, races the operation against
/// the policy timeout and always returns the client, even when the caller's
/// future is dropped mid-attempt. Timeouts drop the operation future, which
/// cancels the abandoned work.
pub struct RetryExecutor<C> {
    pool: ResourcePool<C>,
    limiter: Arc<RateLimiter>,
    metrics: Arc<MetricsCollector>,
    policy: RetryPolicy,
    logging_enabled: bool,
}

impl<C: Send + Sync + 'static> RetryExecutor<C> {
    pub fn new(
        pool: ResourcePool<C>,
        limiter: Arc<RateLimiter>,
        metrics: Arc<MetricsCollector>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            limiter,
            metrics,
            policy,
            logging_enabled: true,
        }
    }

    /// Silence retry diagnostics.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `operation` on behalf of `identifier`.
    ///
    /// # Errors
    ///
    /// - [`Error::RateLimitExceeded`] if `identifier` is over budget; no
    ///   client is checked out
    /// - [`Error::NotInitialized`] if the pool closed before the first
    ///   attempt; a pool closed during backoff ends the call with the
    ///   previous attempt's error instead
    /// - The last attempt's [`Error::Operation`], [`Error::Timeout`] or
    ///   [`Error::PoolExhausted`] once every attempt has failed
    pub async fn execute<T, F, Fut>(&self, identifier: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if !self.limiter.check(identifier) {
            self.metrics.record_rate_limited();
            if self.logging_enabled {
                warn!(identifier, "Rate limit exceeded");
            }
            return Err(Error::RateLimitExceeded {
                identifier: identifier.to_owned(),
            });
        }

        let max_attempts = self.policy.max_retries;
        let mut attempt = 0;
        let mut last_error = None;

        loop {
            attempt += 1;
            let err = match self.attempt(&mut operation).await {
                Ok(value) => {
                    if attempt > 1 && self.logging_enabled {
                        debug!(identifier, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(Error::NotInitialized) => {
                    return Err(last_error.unwrap_or(Error::NotInitialized));
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            self.metrics.record_error();

            if attempt >= max_attempts {
                if self.logging_enabled {
                    warn!(identifier, attempts = attempt, error = %err, "Operation failed, retries exhausted");
                }
                return Err(err);
            }

            let delay = self.policy.backoff(attempt);
            if self.logging_enabled {
                warn!(
                    identifier,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
            }
            last_error = Some(err);
            sleep(delay).await;
        }
    }

    async fn attempt<T, F, Fut>(&self, operation: &mut F) -> Result<T>
    where
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let client = match self.pool.acquire().await {
            Ok(client) => client,
            Err(err) => {
                if matches!(err, Error::PoolExhausted { .. }) {
                    self.metrics.record_failed_connection();
                }
                return Err(err);
            }
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.policy.operation_timeout, operation(client.client())).await;
        drop(client);

        match outcome {
            Ok(Ok(value)) => {
                self.metrics.record_success(started.elapsed());
                Ok(value)
            }
            Ok(Err(err)) => Err(Error::Operation(err)),
            Err(_elapsed) => Err(Error::Timeout {
                timeout_ms: self.policy.operation_timeout.as_millis() as u64,
            }),
        }
    }
}
