//! Mock backend clients and scripted operations.
//!
//! - [`MockBackend`] - Shared control panel for a set of [`MockClient`]s:
//!   toggle probe health, add probe latency, fail construction of a slot.
//! - [`ScriptedOperation`] - Operation that fails a fixed number of times
//!   before succeeding, optionally slowly. Best for retry and timeout tests.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::pool::EntryId;
use crate::port::{BackendClient, ClientFactory};

struct BackendState {
    healthy: AtomicBool,
    probes: AtomicU32,
    probe_latency_ms: AtomicU64,
    /// Entry id whose construction fails; 0 means none.
    fail_construction_at: AtomicU64,
    constructed: AtomicU32,
}

/// Controls every [`MockClient`] it hands out.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<BackendState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(BackendState {
                healthy: AtomicBool::new(true),
                probes: AtomicU32::new(0),
                probe_latency_ms: AtomicU64::new(0),
                fail_construction_at: AtomicU64::new(0),
                constructed: AtomicU32::new(0),
            }),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_probe_latency(&self, latency: Duration) {
        self.state
            .probe_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make the factory fail when building entry `entry_id`.
    pub fn fail_construction_at(&self, entry_id: EntryId) {
        self.state
            .fail_construction_at
            .store(entry_id, Ordering::SeqCst);
    }

    /// Total probes issued across all clients.
    pub fn probe_count(&self) -> u32 {
        self.state.probes.load(Ordering::SeqCst)
    }

    /// Clients successfully built by [`factory`](Self::factory).
    pub fn constructed(&self) -> u32 {
        self.state.constructed.load(Ordering::SeqCst)
    }

    pub fn client(&self, id: EntryId) -> MockClient {
        MockClient {
            id,
            state: Arc::clone(&self.state),
        }
    }

    pub fn factory(&self) -> ClientFactory<MockClient> {
        let backend = self.clone();
        Arc::new(move |_config: &ManagerConfig, id: EntryId| {
            if backend.state.fail_construction_at.load(Ordering::SeqCst) == id {
                return Err(Error::ClientConstruction(format!("mock slot {id} refused")));
            }
            backend.state.constructed.fetch_add(1, Ordering::SeqCst);
            Ok(backend.client(id))
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Pooled handle produced by a [`MockBackend`].
pub struct MockClient {
    id: EntryId,
    state: Arc<BackendState>,
}

impl MockClient {
    pub fn id(&self) -> EntryId {
        self.id
    }
}

#[async_trait]
impl BackendClient for MockClient {
    async fn probe(&self) -> Result<()> {
        self.state.probes.fetch_add(1, Ordering::SeqCst);
        let latency = self.state.probe_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.state.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Operation(anyhow::anyhow!("mock backend unavailable")))
        }
    }
}

/// Operation that fails its first `failures` calls, then succeeds.
///
/// Clones share call counters. A successful call yields its 1-based call
/// number; a failed call yields `"attempt {n} failed"`.
#[derive(Clone)]
pub struct ScriptedOperation {
    failures: u32,
    latency: Duration,
    calls: Arc<AtomicU32>,
    completed: Arc<AtomicU32>,
}

impl ScriptedOperation {
    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
            completed: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Sleep this long before resolving each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls started.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran to completion (not cancelled).
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn run(&self) -> impl Future<Output = anyhow::Result<u32>> + Send + 'static {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let failures = self.failures;
        let latency = self.latency;
        let completed = Arc::clone(&self.completed);

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            completed.fetch_add(1, Ordering::SeqCst);
            if call <= failures {
                anyhow::bail!("attempt {call} failed");
            }
            Ok(call)
        }
    }
}
