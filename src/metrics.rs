//! Runtime metrics for the connection manager.
//!
//! Counters are atomics updated with relaxed ordering; the latency average
//! and timestamps sit behind a mutex held only for the update itself.
//! Readers get a [`MetricsSnapshot`] copy.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

/// Point-in-time copy of the manager's metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Entries created in the current pool.
    pub total_connections: usize,
    /// Entries currently checked out.
    pub active_connections: usize,
    /// Failed acquisitions plus failed pool constructions.
    pub failed_connections: u64,
    pub average_response_time_ms: f64,
    /// Successful operations.
    pub request_count: u64,
    /// Failed attempts, including timeouts.
    pub error_count: u64,
    pub rate_limited_count: u64,
    pub health_checks_passed: u64,
    pub health_checks_failed: u64,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub uptime_ms: u64,
}

struct Timing {
    average_ms: f64,
    samples: u64,
    started_at: DateTime<Utc>,
    started: Instant,
    last_health_check_at: Option<DateTime<Utc>>,
}

impl Timing {
    fn new() -> Self {
        Self {
            average_ms: 0.0,
            samples: 0,
            started_at: Utc::now(),
            started: Instant::now(),
            last_health_check_at: None,
        }
    }
}

/// Aggregates counters and latency for the lifetime of a manager.
pub struct MetricsCollector {
    total_connections: AtomicUsize,
    failed_connections: AtomicU64,
    request_count: AtomicU64,
    error_count: AtomicU64,
    rate_limited: AtomicU64,
    health_passed: AtomicU64,
    health_failed: AtomicU64,
    timing: Mutex<Timing>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            total_connections: AtomicUsize::new(0),
            failed_connections: AtomicU64::new(0),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            health_passed: AtomicU64::new(0),
            health_failed: AtomicU64::new(0),
            timing: Mutex::new(Timing::new()),
        }
    }

    pub fn set_total_connections(&self, total: usize) {
        self.total_connections.store(total, Ordering::Relaxed);
    }

    /// Record a successful operation and fold its latency into the average.
    pub fn record_success(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;
        {
            let mut timing = self.timing.lock();
            let n = timing.samples as f64;
            timing.average_ms = (timing.average_ms * n + latency_ms) / (n + 1.0);
            timing.samples += 1;
        }
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_connection(&self) {
        self.failed_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_check(&self, passed: bool) {
        if passed {
            self.health_passed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.health_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.timing.lock().last_health_check_at = Some(Utc::now());
    }

    /// Uptime since construction or the last [`reset`](Self::reset).
    pub fn uptime(&self) -> Duration {
        self.timing.lock().started.elapsed()
    }

    /// Zero every counter and restart the uptime clock.
    pub fn reset(&self) {
        self.total_connections.store(0, Ordering::Relaxed);
        self.failed_connections.store(0, Ordering::Relaxed);
        self.request_count.store(0, Ordering::Relaxed);
        self.error_count.store(0, Ordering::Relaxed);
        self.rate_limited.store(0, Ordering::Relaxed);
        self.health_passed.store(0, Ordering::Relaxed);
        self.health_failed.store(0, Ordering::Relaxed);
        *self.timing.lock() = Timing::new();
    }

    /// Copy the current values. `active_connections` comes from the pool.
    pub fn snapshot(&self, active_connections: usize) -> MetricsSnapshot {
        let (average_response_time_ms, started_at, uptime, last_health_check_at) = {
            let timing = self.timing.lock();
            (
                timing.average_ms,
                timing.started_at,
                timing.started.elapsed(),
                timing.last_health_check_at,
            )
        };

        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections,
            failed_connections: self.failed_connections.load(Ordering::Relaxed),
            average_response_time_ms,
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            rate_limited_count: self.rate_limited.load(Ordering::Relaxed),
            health_checks_passed: self.health_passed.load(Ordering::Relaxed),
            health_checks_failed: self.health_failed.load(Ordering::Relaxed),
            last_health_check_at,
            started_at,
            uptime_ms: uptime.as_millis() as u64,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
