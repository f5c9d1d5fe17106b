//! Change-notification fan-out.
//!
//! [`Subscribers`] is the shared subscriber-list machinery used by the
//! semantic model, the aggregator view, and the visual model store: an
//! explicit list of registered callbacks, invoked synchronously after a
//! batched mutation completes, with an unsubscribe handle returned at
//! registration.
//!
//! Callbacks receive the change event by reference and must not reach back
//! into the store that emitted it; mutation entry points run to completion
//! before the next event is processed. A callback that needs to trigger
//! follow-up mutations should enqueue them for after the notification pass.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

type Callback<E> = Rc<dyn Fn(&E)>;

struct SubscriberList<E: 'static> {
    next_key: u64,
    callbacks: Vec<(u64, Callback<E>)>,
}

/// A list of registered change callbacks.
pub struct Subscribers<E: 'static> {
    inner: Rc<RefCell<SubscriberList<E>>>,
}

impl<E: 'static> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Subscribers<E> {
    /// Creates an empty subscriber list.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubscriberList {
                next_key: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Registers a callback and returns its unsubscribe handle.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let key = {
            let mut list = self.inner.borrow_mut();
            let key = list.next_key;
            list.next_key += 1;
            list.callbacks.push((key, Rc::new(callback)));
            key
        };

        let weak: Weak<RefCell<SubscriberList<E>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .borrow_mut()
                        .callbacks
                        .retain(|(registered, _)| *registered != key);
                }
            })),
        }
    }

    /// Invokes every registered callback with the given event.
    ///
    /// The callback list is snapshotted first, so a callback unsubscribing
    /// itself (or subscribing a new callback) during the pass does not
    /// invalidate the iteration; new subscribers only see later events.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .inner
            .borrow()
            .callbacks
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    /// The number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    /// Returns `true` when no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.len())
            .finish()
    }
}

/// Handle returned by [`Subscribers::subscribe`].
///
/// Unsubscription is explicit; dropping the handle keeps the callback
/// registered.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Removes the callback this handle was returned for.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
