//! Pool entry state and lease identifiers.

use std::sync::Arc;

use tokio::time::Instant;

/// Stable identifier of a pool slot. Assigned 1, 2, 3, ... at construction.
pub type EntryId = u64;

/// Proof of one checkout of one entry.
///
/// Every acquire hands out a fresh lease number, so releasing an old lease
/// never frees an entry that has since been checked out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lease {
    pub(super) entry_id: EntryId,
    pub(super) number: u64,
}

impl Lease {
    /// The pool slot this lease refers to.
    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }
}

/// One pool slot. Owned exclusively by the pool.
pub(super) struct PoolEntry<C> {
    pub(super) id: EntryId,
    pub(super) client: Arc<C>,
    /// Lease number of the current holder; `None` while free.
    pub(super) lease: Option<u64>,
    pub(super) last_used_at: Option<Instant>,
}

impl<C> PoolEntry<C> {
    pub(super) fn new(id: EntryId, client: C) -> Self {
        Self {
            id,
            client: Arc::new(client),
            lease: None,
            last_used_at: None,
        }
    }

    pub(super) fn in_use(&self) -> bool {
        self.lease.is_some()
    }

    pub(super) fn status(&self) -> EntryStatus {
        EntryStatus {
            id: self.id,
            in_use: self.in_use(),
            last_used_at: self.last_used_at,
        }
    }
}

/// Read-only view of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStatus {
    pub id: EntryId,
    pub in_use: bool,
    pub last_used_at: Option<Instant>,
}
