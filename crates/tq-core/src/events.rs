//! Session event bus
//!
//! The session publishes lifecycle events for presentation collaborators
//! (notifications, title bars, spinners). Publishing is synchronous and
//! best-effort; events never carry record data.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Lifecycle events published by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A file was loaded and the preview is in the buffer
    DatasetLoaded {
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
    /// The session returned to the no-file state
    DatasetClosed,
    /// The configuration was confirmed and the filter value cache refreshed
    SettingConfirmed,
    /// A search replaced the record buffer and column layout
    ResultsReplaced { rows: usize },
    /// An incremental page passed the offset check and was appended
    PageAppended { start: usize, rows: usize },
    /// A save attempt finished; `ok` is false when the backend rejected it
    SaveCompleted { path: PathBuf, ok: bool },
}

/// Receiver for session events
pub trait SessionSubscriber: Send + Sync {
    fn on_session_event(&self, event: &SessionEvent);
}

/// Fan-out of session events to weakly-held subscribers
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Weak<dyn SessionSubscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; the bus keeps only a weak reference
    pub fn subscribe(&self, subscriber: Arc<dyn SessionSubscriber>) {
        self.subscribers.lock().push(Arc::downgrade(&subscriber));
    }

    /// Deliver an event to all live subscribers
    pub fn publish(&self, event: &SessionEvent) {
        let mut subscribers = self.subscribers.lock();

        // Drop subscribers whose owners went away
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_session_event(event);
            }
        }
    }
}
