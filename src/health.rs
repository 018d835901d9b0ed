//! Periodic liveness probing of the pooled backend.
//!
//! The monitor is `Stopped` until [`HealthMonitor::start`] and goes back to
//! `Stopped` on [`HealthMonitor::stop`]. While running, a background task
//! probes the pool every interval through the normal acquire/release path.
//! Probe failures are reported, never raised, and never stop the timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::metrics::MetricsCollector;
use crate::pool::ResourcePool;
use crate::port::{BackendClient, Event, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

pub struct HealthMonitor<C> {
    pool: ResourcePool<C>,
    metrics: Arc<MetricsCollector>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    probe_timeout: Duration,
    logging_enabled: bool,
    running: AtomicBool,
    last_passed_at: Mutex<Option<Instant>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: BackendClient> HealthMonitor<C> {
    pub fn new(
        pool: ResourcePool<C>,
        metrics: Arc<MetricsCollector>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            metrics,
            notifier,
            interval,
            probe_timeout,
            logging_enabled: true,
            running: AtomicBool::new(false),
            last_passed_at: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Silence monitor diagnostics. Notifications still fire.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn state(&self) -> MonitorState {
        if self.running.load(Ordering::Acquire) {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    /// Start the periodic probe task. No-op if already running.
    ///
    /// The first scheduled probe fires one interval after start.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let period = monitor.interval;
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if monitor.logging_enabled {
                debug!(interval_ms = period.as_millis() as u64, "Health monitor started");
            }

            loop {
                ticker.tick().await;
                monitor.probe().await;
            }
        });

        *self.task.lock() = Some(handle);
    }

    /// Stop the probe task. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            if self.logging_enabled {
                debug!("Health monitor stopped");
            }
        }
    }

    /// Run one probe now and report the outcome.
    ///
    /// A probe while stopped is skipped and reported as failed.
    pub async fn probe(&self) -> bool {
        if self.state() == MonitorState::Stopped {
            if self.logging_enabled {
                debug!("Health probe skipped, monitor not running");
            }
            self.notifier.notify(Event::HealthCheckFailed {
                reason: "health monitor is not running".into(),
            });
            return false;
        }

        match self.probe_once().await {
            Ok(()) => {
                *self.last_passed_at.lock() = Some(Instant::now());
                self.metrics.record_health_check(true);
                self.notifier.notify(Event::HealthCheckPassed);
                true
            }
            Err(err) => {
                if self.logging_enabled {
                    warn!(error = %err, "Health probe failed");
                }
                self.metrics.record_health_check(false);
                self.notifier.notify(Event::HealthCheckFailed {
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    async fn probe_once(&self) -> Result<()> {
        let client = self.pool.acquire().await?;
        match tokio::time::timeout(self.probe_timeout, client.probe()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(Error::Timeout {
                timeout_ms: self.probe_timeout.as_millis() as u64,
            }),
        }
    }

    /// Running, with a passing probe within the last two intervals.
    pub fn is_healthy(&self) -> bool {
        if self.state() == MonitorState::Stopped {
            return false;
        }
        match *self.last_passed_at.lock() {
            Some(at) => at.elapsed() < self.interval * 2,
            None => false,
        }
    }
}
