#![forbid(unsafe_code)]

//! Change notification for [`UndoStack`](crate::UndoStack).
//!
//! # Design
//!
//! Listeners are stored as `Weak` references to callbacks whose strong `Rc`
//! lives inside a [`Subscription`] guard handed to the caller. Dropping the
//! guard unsubscribes; dead entries are pruned lazily during `notify()`.
//!
//! Callbacks only receive the payload, never the stack. Since every stack
//! mutation takes `&mut self`, a listener cannot re-enter the stack while a
//! notification is being delivered.

use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// Ordered list of live callbacks for one kind of notification.
pub(crate) struct Listeners<T> {
    subscribers: Vec<CallbackWeak<T>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: 'static> Listeners<T> {
    /// Register a callback. It stays registered while the returned guard lives.
    pub(crate) fn subscribe(&mut self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.subscribers.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Invoke live callbacks in registration order and prune dead ones.
    pub(crate) fn notify(&mut self, value: &T) {
        self.subscribers.retain(|w| w.strong_count() > 0);
        // Upgrade first so a callback dropping its own guard mid-delivery
        // does not disturb the iteration.
        let callbacks: Vec<CallbackRc<T>> =
            self.subscribers.iter().filter_map(Weak::upgrade).collect();
        for cb in &callbacks {
            cb(value);
        }
    }

    /// Number of registered callbacks, including dead ones not yet pruned.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// RAII guard for a stack listener.
///
/// Dropping the `Subscription` drops the strong `Rc` of the callback, so the
/// `Weak` kept by the stack fails to upgrade on the next notification.
#[must_use = "dropping the subscription unsubscribes the callback immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
