//! Connection manager: the composition root for pooled backend access.
//!
//! Owns the pool, rate limiter, retry executor, health monitor and metrics,
//! and is the only surface collaborators use. Construct one per service
//! and share it by `Arc`; there is no global instance.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► initialize() ──► execute() / perform_health_check() ... ──► cleanup()
//!  (uninitialized)   (validated, pool built, monitor running)     (drained, uninitialized)
//! ```
//!
//! `initialize` and `cleanup` are serialized against each other. Calls to
//! `execute` that are already running keep their own reference to the
//! active state, so `cleanup` can wait for them to hand back their clients.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{validate, ManagerConfig, SanitizedConfig};
use crate::error::{Error, Result};
use crate::health::HealthMonitor;
use crate::limiter::RateLimiter;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::pool::ResourcePool;
use crate::port::{BackendClient, ClientFactory, Event, Notifier, NullNotifier};
use crate::retry::{RetryExecutor, RetryPolicy};

/// Everything that exists only between `initialize` and `cleanup`.
struct ActiveState<C: BackendClient> {
    config: ManagerConfig,
    pool: ResourcePool<C>,
    limiter: Arc<RateLimiter>,
    metrics: Arc<MetricsCollector>,
    executor: RetryExecutor<C>,
    monitor: Arc<HealthMonitor<C>>,
    sweeper: JoinHandle<()>,
}

impl<C: BackendClient> ActiveState<C> {
    fn shutdown(&self) {
        self.monitor.stop();
        self.sweeper.abort();
        self.pool.close();
    }
}

impl<C: BackendClient> Drop for ActiveState<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Pooled, rate-limited, health-checked access to the data backend.
pub struct ConnectionManager<C: BackendClient> {
    config: ManagerConfig,
    factory: ClientFactory<C>,
    notifier: Arc<dyn Notifier>,
    /// Collector of the current lifecycle. Replaced on every `initialize`
    /// and `cleanup`, so late writes from detached operations land in a
    /// collector nobody reads any more.
    metrics: RwLock<Arc<MetricsCollector>>,
    active: RwLock<Option<Arc<ActiveState<C>>>>,
    lifecycle: tokio::sync::Mutex<()>,
}

impl<C: BackendClient> ConnectionManager<C> {
    /// Create an uninitialized manager.
    ///
    /// Nothing is validated or built until [`initialize`](Self::initialize).
    pub fn new(config: ManagerConfig, factory: ClientFactory<C>) -> Self {
        Self {
            config,
            factory,
            notifier: Arc::new(NullNotifier),
            metrics: RwLock::new(Arc::new(MetricsCollector::new())),
            active: RwLock::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Route lifecycle and health events to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Validate the config, build the pool and start background tasks.
    ///
    /// Runs one health probe before returning; a failed probe is logged and
    /// reported but does not fail initialization. Calling this on an
    /// initialized manager is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if validation fails
    /// - The factory's error if any client cannot be built; no partial pool
    ///   is kept
    pub async fn initialize(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;

        if self.active.read().is_some() {
            if self.config.logging_enabled {
                warn!("Connection manager already initialized, ignoring");
            }
            return Ok(());
        }

        let config = validate(&self.config).map_err(|e| self.report(Error::Config(e)))?;
        let log = config.logging_enabled;

        let metrics = Arc::new(MetricsCollector::new());
        *self.metrics.write() = Arc::clone(&metrics);
        let factory = &self.factory;
        let pool = match ResourcePool::new(config.pool_size, config.acquire_timeout(), |id| {
            factory(&config, id)
        }) {
            Ok(pool) => pool,
            Err(err) => {
                metrics.record_failed_connection();
                return Err(self.report(err));
            }
        };
        metrics.set_total_connections(pool.size());

        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_requests,
            config.rate_limit_window(),
        ));
        let executor = RetryExecutor::new(
            pool.clone(),
            Arc::clone(&limiter),
            Arc::clone(&metrics),
            RetryPolicy::from_config(&config),
        )
        .with_logging(log);
        let monitor = Arc::new(HealthMonitor::new(
            pool.clone(),
            Arc::clone(&metrics),
            Arc::clone(&self.notifier),
            config.health_check_interval(),
            config.operation_timeout(),
        )
        .with_logging(log));

        monitor.start();
        let sweeper = limiter.spawn_sweeper(config.rate_limit_sweep_interval());

        if !monitor.probe().await && log {
            warn!("Initial health check failed, continuing");
        }

        let pool_size = pool.size();
        if log {
            debug!(
                endpoint = %config.endpoint,
                pool_size,
                max_retries = config.max_retries,
                rate_limit = config.rate_limit_requests,
                "Connection manager ready"
            );
        }

        *self.active.write() = Some(Arc::new(ActiveState {
            config,
            pool,
            limiter,
            metrics,
            executor,
            monitor,
            sweeper,
        }));
        self.notifier.notify(Event::Initialized { pool_size });

        Ok(())
    }

    /// Run `operation` against a pooled client on behalf of `identifier`.
    ///
    /// See [`RetryExecutor::execute`] for the retry and timeout rules.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before `initialize` or after `cleanup`
    /// - [`Error::RateLimitExceeded`] if `identifier` is over budget
    /// - The last attempt's error once retries are exhausted
    pub async fn execute<T, F, Fut>(&self, identifier: &str, operation: F) -> Result<T>
    where
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let state = self.state()?;
        match state.executor.execute(identifier, operation).await {
            Ok(value) => Ok(value),
            Err(err @ (Error::RateLimitExceeded { .. } | Error::NotInitialized)) => Err(err),
            Err(err) => Err(self.report(err)),
        }
    }

    /// Probe the backend now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before `initialize`. Probe failures
    /// are reported through the notifier and return `Ok(false)`.
    pub async fn perform_health_check(&self) -> Result<bool> {
        let state = self.state()?;
        Ok(state.monitor.probe().await)
    }

    /// Initialized, with a passing probe within two health-check intervals.
    pub fn is_healthy(&self) -> bool {
        self.active
            .read()
            .as_ref()
            .is_some_and(|state| state.monitor.is_healthy())
    }

    pub fn is_initialized(&self) -> bool {
        self.active.read().is_some()
    }

    /// Metrics of the current lifecycle.
    ///
    /// Zeroed after `cleanup`. A failed `initialize` leaves its failure
    /// counted here until the next attempt.
    pub fn metrics(&self) -> MetricsSnapshot {
        match self.active.read().as_ref() {
            Some(state) => state.metrics.snapshot(state.pool.active()),
            None => self.metrics.read().snapshot(0),
        }
    }

    /// The effective config without its credential.
    ///
    /// Reflects the normalized config once initialized.
    pub fn config(&self) -> SanitizedConfig {
        match self.active.read().as_ref() {
            Some(state) => state.config.sanitized(),
            None => self.config.sanitized(),
        }
    }

    /// Tear down to the uninitialized state.
    ///
    /// Stops background tasks, refuses new work, waits (bounded by
    /// `drain_timeout_ms`) for in-flight operations to hand back their
    /// clients, then discards the pool, rate-limit state and metrics.
    /// Idempotent.
    pub async fn cleanup(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        let Some(state) = self.active.write().take() else {
            return;
        };
        let log = state.config.logging_enabled;

        state.shutdown();
        if !state.pool.drain(state.config.drain_timeout()).await && log {
            warn!(
                active = state.pool.active(),
                "Cleanup timed out waiting for in-flight operations"
            );
        }
        state.limiter.clear();
        drop(state);

        *self.metrics.write() = Arc::new(MetricsCollector::new());
        if log {
            debug!("Connection manager torn down");
        }
        self.notifier.notify(Event::Cleanup);
    }

    fn state(&self) -> Result<Arc<ActiveState<C>>> {
        self.active.read().clone().ok_or(Error::NotInitialized)
    }

    fn report(&self, err: Error) -> Error {
        self.notifier.notify(Event::Error {
            message: err.to_string(),
        });
        err
    }
}
