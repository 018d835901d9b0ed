//! Notifier port for lifecycle and health notifications.
//!
//! These are the only signals the owning service observes from the
//! manager. They never expose pool internals.

use tracing::{error, info, warn};

/// Events emitted by the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Manager finished initializing.
    Initialized {
        /// Number of pooled clients created.
        pool_size: usize,
    },
    /// An operation or initialization failed.
    Error {
        /// Rendered error message.
        message: String,
    },
    /// A health probe succeeded.
    HealthCheckPassed,
    /// A health probe failed or was skipped.
    HealthCheckFailed {
        /// Why the probe failed.
        reason: String,
    },
    /// Manager was torn down.
    Cleanup,
}

/// Trait for notification handlers.
///
/// Implement this trait to receive events from the manager.
/// Notifications are fire-and-forget.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - The `notify` method should not block or perform slow I/O synchronously
/// - Consider spawning async tasks for slow operations
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }
}

/// A no-op notifier for when nobody is listening.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::Initialized { pool_size } => {
                info!(pool_size, "Connection manager initialized");
            }
            Event::Error { message } => {
                error!(error = %message, "Connection manager error");
            }
            Event::HealthCheckPassed => {
                info!("Health check passed");
            }
            Event::HealthCheckFailed { reason } => {
                warn!(reason = %reason, "Health check failed");
            }
            Event::Cleanup => {
                info!("Connection manager cleaned up");
            }
        }
    }
}
