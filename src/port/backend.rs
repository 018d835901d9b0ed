//! Backend client port.
//!
//! A pooled "connection" is one implementation of [`BackendClient`]. It
//! wraps a stateless HTTPS client, so the pool bounds concurrent calls
//! rather than reusing sockets.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ManagerConfig;
use crate::error::Result;

/// Handle to the remote data backend held by one pool slot.
#[async_trait]
pub trait BackendClient: Send + Sync + 'static {
    /// Issue a minimal read-only call to confirm the backend is reachable.
    ///
    /// Used by the health monitor; must be cheap and side-effect free.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the call.
    async fn probe(&self) -> Result<()>;
}

/// Factory creating the client for one pool slot.
///
/// Receives the validated config and the slot's entry id. Any error aborts
/// pool construction entirely.
pub type ClientFactory<C> = Arc<dyn Fn(&ManagerConfig, u64) -> Result<C> + Send + Sync>;
