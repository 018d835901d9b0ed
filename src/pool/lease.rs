//! RAII guard for a checked-out client.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::state::Lease;
use super::PoolInner;

/// A client checked out of a [`ResourcePool`](super::ResourcePool).
///
/// The entry goes back to the pool when the guard is dropped, whether the
/// holder finished, failed, timed out or was cancelled.
pub struct PooledClient<C> {
    pool: Arc<PoolInner<C>>,
    lease: Lease,
    client: Arc<C>,
    released: bool,
}

impl<C> PooledClient<C> {
    pub(super) fn new(pool: Arc<PoolInner<C>>, lease: Lease, client: Arc<C>) -> Self {
        Self {
            pool,
            lease,
            client,
            released: false,
        }
    }

    pub fn lease(&self) -> Lease {
        self.lease
    }

    /// Shared handle to the underlying client.
    ///
    /// The handle outlives the lease if cloned away; the pool only tracks
    /// the lease.
    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// Return the entry to the pool now instead of on drop.
    pub fn release(mut self) {
        self.released = true;
        self.pool.release(self.lease);
    }
}

impl<C> Deref for PooledClient<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.client
    }
}

impl<C> fmt::Debug for PooledClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledClient")
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}

impl<C> Drop for PooledClient<C> {
    fn drop(&mut self) {
        if !self.released {
            self.pool.release(self.lease);
        }
    }
}
