//! Signals and filter chains.
//!
//! A [`Signal`] notifies connected receivers that something happened
//! (a language was added, a translation group was saved). A [`Filter`]
//! threads a value through connected callbacks, each of which may replace
//! it; the term kind uses filters to let callers override the language and
//! parent of a term being inserted.
//!
//! ## Usage
//!
//! ```
//! use polyglot_rs_core::hooks::{Filter, Signal};
//! use std::sync::Arc;
//!
//! let saved: Signal<i64> = Signal::new();
//! saved.connect("log", Arc::new(|id: &i64| println!("saved {id}")));
//! assert_eq!(saved.send(&42), 1);
//!
//! let parent: Filter<i64, str> = Filter::new();
//! parent.connect("flatten", Arc::new(|_parent: i64, _taxonomy: &str| 0));
//! assert_eq!(parent.apply(12, "category"), 0);
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// The type signature for a signal receiver callback.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A signal that can be connected to and dispatched.
///
/// Receivers are called in the order they were connected.
pub struct Signal<T: ?Sized + 'static> {
    receivers: RwLock<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: ?Sized + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

impl<T: ?Sized + 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: RwLock::new(Vec::new()),
        }
    }

    /// Connects a receiver to this signal.
    ///
    /// If a receiver with the same ID is already connected, it is replaced.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.receivers.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.receivers.write().unwrap_or_else(PoisonError::into_inner);
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Sends the signal to all connected receivers and returns how many ran.
    pub fn send(&self, payload: &T) -> usize {
        // Snapshot so receivers may connect or disconnect while being called.
        let receivers: Vec<SignalReceiver<T>> = self
            .receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in &receivers {
            callback(payload);
        }
        receivers.len()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// The type signature for a filter callback: takes the current value and a
/// context, returns the (possibly replaced) value.
pub type FilterCallback<V, C> = Arc<dyn Fn(V, &C) -> V + Send + Sync>;

/// A chain of callbacks that may each transform a value.
pub struct Filter<V: 'static, C: ?Sized + 'static> {
    callbacks: RwLock<Vec<(String, FilterCallback<V, C>)>>,
}

impl<V: 'static, C: ?Sized + 'static> Default for Filter<V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static, C: ?Sized + 'static> fmt::Debug for Filter<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

impl<V: 'static, C: ?Sized + 'static> Filter<V, C> {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Connects a callback, replacing any callback with the same ID.
    pub fn connect(&self, callback_id: impl Into<String>, callback: FilterCallback<V, C>) {
        let id = callback_id.into();
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = callbacks.iter_mut().find(|(cid, _)| *cid == id) {
            entry.1 = callback;
        } else {
            callbacks.push((id, callback));
        }
    }

    /// Disconnects the callback with the given ID.
    pub fn disconnect(&self, callback_id: &str) -> bool {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        let len_before = callbacks.len();
        callbacks.retain(|(id, _)| id != callback_id);
        callbacks.len() < len_before
    }

    /// Runs `value` through every callback in connection order.
    pub fn apply(&self, value: V, context: &C) -> V {
        let callbacks: Vec<FilterCallback<V, C>> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        callbacks
            .iter()
            .fold(value, |value, callback| callback(value, context))
    }

    /// Returns the number of connected callbacks.
    pub fn callback_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
