//! Trait definitions (hexagonal ports).
//!
//! Ports are the seams the manager talks through. Adapters implement them
//! to plug in the real backend client and the owning service's alerting.
//!
//! # Available Ports
//!
//! - [`BackendClient`], [`ClientFactory`] - The pooled handle to the data backend
//! - [`Notifier`] - Lifecycle and health notifications

mod backend;
mod notifier;

pub use backend::{BackendClient, ClientFactory};
pub use notifier::{Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier};
