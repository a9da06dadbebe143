//! Thread-safe observer registry.
//!
//! The delivery primitive for the event stream: a mapping of opaque
//! subscription handles to callbacks, safe to mutate concurrently with
//! delivery.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::error;

/// Opaque handle identifying one registered observer.
///
/// Handles are unique for the lifetime of the registry and never reused
/// after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registry of observers keyed by [`SubscriptionId`], delivering events in
/// registration order.
pub struct ObserverRegistry<E> {
    observers: Mutex<Vec<(SubscriptionId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> ObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a callback under a fresh unique handle.
    ///
    /// Safe to call concurrently with delivery; a callback registered while
    /// a delivery is in flight is not invoked for that delivery.
    pub fn register(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. A no-op for unknown or already-removed handles.
    pub fn unregister(&self, id: SubscriptionId) {
        self.lock().retain(|(other, _)| *other != id);
    }

    /// Number of currently registered observers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invoke every currently-registered callback with `event`.
    ///
    /// The callback set is snapshotted atomically at the start of delivery;
    /// handles removed after the snapshot are skipped. A panicking callback
    /// is logged and does not abort delivery to the rest.
    pub fn deliver(&self, event: &E) {
        let snapshot: Vec<(SubscriptionId, Callback<E>)> = self.lock().clone();

        for (id, callback) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(subscription = id.0, "observer panicked during delivery");
            }
        }
    }

    fn is_registered(&self, id: SubscriptionId) -> bool {
        self.lock().iter().any(|(other, _)| *other == id)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Callback<E>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
