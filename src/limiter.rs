//! Per-identifier fixed-window rate limiting.
//!
//! Each identifier gets a counter and a wall-clock reset time. The first
//! request after the reset time starts a fresh window, so memory is O(1)
//! per identifier at the cost of burst precision at window edges.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Request budget for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Instant,
}

impl RateLimitEntry {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_reset_at: now + window,
        }
    }
}

/// Fixed-window request counter keyed by caller identifier.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: DashMap::new(),
        }
    }

    /// Count a request for `identifier` and report whether it fits the budget.
    ///
    /// A denied request leaves the entry untouched.
    pub fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        match self.entries.entry(identifier.to_owned()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitEntry::fresh(now, self.window));
                true
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if now > entry.window_reset_at {
                    *entry = RateLimitEntry::fresh(now, self.window);
                    return true;
                }
                if entry.count >= self.max_requests {
                    debug!(identifier, count = entry.count, "Rate limit reached");
                    return false;
                }
                entry.count += 1;
                true
            }
        }
    }

    /// Requests left for `identifier` in its current window.
    pub fn remaining(&self, identifier: &str) -> u32 {
        match self.entries.get(identifier) {
            Some(entry) if Instant::now() <= entry.window_reset_at => {
                self.max_requests.saturating_sub(entry.count)
            }
            _ => self.max_requests,
        }
    }

    /// Drop entries whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.window_reset_at);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Swept rate-limit entries");
        }
        removed
    }

    /// Spawn a task that sweeps expired windows every `every`.
    ///
    /// The task runs until its handle is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                limiter.sweep();
            }
        })
    }

    /// Number of identifiers currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
