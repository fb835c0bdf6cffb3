//! Test utilities
//!
//! Provides a tracing layer that counts error-level events, for asserting
//! that a failure is logged exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Counts error-level events seen on the current thread
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorCounter {
    errors: Arc<AtomicUsize>,
}

impl ErrorCounter {
    /// Install the counter as the thread-local default subscriber.
    ///
    /// Events are counted until the returned guard is dropped.
    pub(crate) fn install() -> (Self, DefaultGuard) {
        let counter = Self::default();
        let guard = tracing_subscriber::registry()
            .with(counter.clone())
            .set_default();
        (counter, guard)
    }

    pub(crate) fn count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }
}
