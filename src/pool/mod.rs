//! Fixed-size pool of backend clients.
//!
//! # Architecture
//!
//! Entries are created once, up front, and never replaced individually.
//! Entry state lives behind a short-held mutex; a semaphore carries one
//! permit per free entry so [`ResourcePool::acquire`] suspends the calling
//! task instead of polling. Waiting is bounded by the acquire timeout, after
//! which the caller gets [`Error::PoolExhausted`].
//!
//! Checkout is first-free-entry, not FIFO over entries. Releases wake any
//! task draining the pool during shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{Error, Result};

mod lease;
mod state;

pub use lease::PooledClient;
pub use state::{EntryId, EntryStatus, Lease};

use state::PoolEntry;

/// Shared pool state referenced by the pool handle and every lease guard.
pub(crate) struct PoolInner<C> {
    entries: Mutex<Vec<PoolEntry<C>>>,
    available: Semaphore,
    released: Notify,
    next_lease: AtomicU64,
    acquire_timeout: Duration,
}

impl<C> PoolInner<C> {
    /// Free the entry held by `lease`. Returns false if the lease is stale
    /// or unknown.
    fn release(&self, lease: Lease) -> bool {
        let freed = {
            let mut entries = self.entries.lock();
            match entries.iter_mut().find(|e| e.id == lease.entry_id) {
                Some(entry) if entry.lease == Some(lease.number) => {
                    entry.lease = None;
                    true
                }
                _ => false,
            }
        };

        if freed {
            self.available.add_permits(1);
            self.released.notify_waiters();
        } else {
            debug!(entry_id = lease.entry_id, "Ignoring release of inactive lease");
        }
        freed
    }

    fn active(&self) -> usize {
        self.entries.lock().iter().filter(|e| e.in_use()).count()
    }
}

/// Bounded pool of backend clients.
///
/// Cheap to clone; clones share the same entries.
pub struct ResourcePool<C> {
    inner: Arc<PoolInner<C>>,
}

impl<C> Clone for ResourcePool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Send + Sync + 'static> ResourcePool<C> {
    /// Build a pool of `size` entries, calling `make` once per entry.
    ///
    /// # Errors
    ///
    /// Returns the first error from `make`. Entries built before the failure
    /// are dropped; no partial pool is ever returned.
    pub fn new<F>(size: usize, acquire_timeout: Duration, mut make: F) -> Result<Self>
    where
        F: FnMut(EntryId) -> Result<C>,
    {
        let mut entries = Vec::with_capacity(size);
        for id in 1..=size as u64 {
            let client = make(id).map_err(|e| {
                debug!(entry_id = id, error = %e, "Client construction failed, aborting pool");
                e
            })?;
            entries.push(PoolEntry::new(id, client));
        }

        Ok(Self {
            inner: Arc::new(PoolInner {
                entries: Mutex::new(entries),
                available: Semaphore::new(size),
                released: Notify::new(),
                next_lease: AtomicU64::new(0),
                acquire_timeout,
            }),
        })
    }

    /// Check out a free entry, waiting up to the acquire timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::PoolExhausted`] if nothing was freed in time
    /// - [`Error::NotInitialized`] if the pool was closed
    pub async fn acquire(&self) -> Result<PooledClient<C>> {
        let inner = &self.inner;
        let started = Instant::now();

        match tokio::time::timeout(inner.acquire_timeout, inner.available.acquire()).await {
            Ok(Ok(permit)) => permit.forget(),
            Ok(Err(_closed)) => return Err(Error::NotInitialized),
            Err(_elapsed) => {
                let waited_ms = started.elapsed().as_millis() as u64;
                debug!(waited_ms, "Pool exhausted");
                return Err(Error::PoolExhausted { waited_ms });
            }
        }

        let number = inner.next_lease.fetch_add(1, Ordering::Relaxed) + 1;
        let checkout = {
            let mut entries = inner.entries.lock();
            entries.iter_mut().find(|e| !e.in_use()).map(|entry| {
                entry.lease = Some(number);
                entry.last_used_at = Some(Instant::now());
                (entry.id, Arc::clone(&entry.client))
            })
        };

        match checkout {
            Some((entry_id, client)) => {
                let lease = Lease { entry_id, number };
                Ok(PooledClient::new(Arc::clone(inner), lease, client))
            }
            None => {
                // Permit count and entry flags disagree; hand the permit back.
                debug!("Permit granted with no free entry");
                inner.available.add_permits(1);
                Err(Error::PoolExhausted {
                    waited_ms: started.elapsed().as_millis() as u64,
                })
            }
        }
    }

    /// Return the entry held by `lease` to the pool.
    ///
    /// Idempotent: releasing a stale or unknown lease changes nothing and
    /// returns false.
    pub fn release(&self, lease: Lease) -> bool {
        self.inner.release(lease)
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Number of entries currently checked out.
    pub fn active(&self) -> usize {
        self.inner.active()
    }

    /// Snapshot of every entry's state.
    pub fn entries(&self) -> Vec<EntryStatus> {
        self.inner.entries.lock().iter().map(PoolEntry::status).collect()
    }

    /// Stop handing out entries. Pending and future acquires fail with
    /// [`Error::NotInitialized`]; outstanding leases can still be released.
    pub fn close(&self) {
        self.inner.available.close();
        self.inner.released.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.available.is_closed()
    }

    /// Wait until every lease has been released, for at most `timeout`.
    ///
    /// Returns true if the pool drained.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            // Register before checking so a release in between is not lost.
            let released = self.inner.released.notified();
            let active = self.active();
            if active == 0 {
                return true;
            }
            debug!(active, "Waiting for leases to drain");
            if tokio::time::timeout_at(deadline, released).await.is_err() {
                return self.active() == 0;
            }
        }
    }
}
