//! Log capture for asserting what a component emits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts tracing events at or above a severity.
///
/// Installed per thread, so it only sees events from `#[tokio::test]`
/// bodies on the default current-thread runtime.
#[derive(Clone)]
pub struct EventCounter {
    min_level: Level,
    count: Arc<AtomicUsize>,
}

impl EventCounter {
    /// Count events at `level` or more severe.
    pub fn at_least(level: Level) -> Self {
        Self {
            min_level: level,
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Count every event.
    pub fn all() -> Self {
        Self::at_least(Level::TRACE)
    }

    /// Make this the thread's subscriber until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl<S: Subscriber> Layer<S> for EventCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // More verbose levels compare greater.
        if *event.metadata().level() <= self.min_level {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }
}
