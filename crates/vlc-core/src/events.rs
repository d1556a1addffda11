//! Event fan-out
//!
//! An ordered observer registry. Listeners run synchronously on the
//! dispatching thread in registration order, so a slow listener delays
//! every listener after it.

use std::sync::{Arc, Mutex};

use crate::protocol::Event;

/// Callback invoked with each dispatched item
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered list of listeners for items of type `T`
pub struct Registry<T: ?Sized> {
    listeners: Mutex<Vec<Listener<T>>>,
}

impl<T: ?Sized> Registry<T> {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Append a listener; it sees every item dispatched after this call
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.lock().push(Arc::new(listener));
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nobody is listening
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener with `item`.
    ///
    /// Iterates a snapshot, so listeners may subscribe others without
    /// deadlocking; those join from the next dispatch.
    pub fn dispatch(&self, item: &T) {
        let snapshot: Vec<Listener<T>> = self.lock().clone();
        for listener in snapshot {
            listener(item);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Listener<T>>> {
        // push() never leaves the Vec half-updated, so a poisoned lock is still usable
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribers to classified device events
pub type EventBus = Registry<Event>;
