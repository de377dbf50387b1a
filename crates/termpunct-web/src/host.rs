#![forbid(unsafe_code)]

//! Host-side plumbing shared by the `wasm32` binding: listener registration
//! with guaranteed removal, and write delivery that stops at teardown.
//!
//! Both are generic over the event target and the write callback so they run
//! under native tests.

use std::fmt::Debug;

/// Something listeners can be attached to (a DOM `EventTarget`).
pub trait ListenerTarget {
    type Callback;
    type Error: Debug;

    fn add_listener(&self, kind: &'static str, callback: &Self::Callback) -> Result<(), Self::Error>;

    fn remove_listener(
        &self,
        kind: &'static str,
        callback: &Self::Callback,
    ) -> Result<(), Self::Error>;
}

/// Listeners registered on one target.
///
/// Owns the callbacks and unregisters every one of them before they are
/// freed, whether through [`remove_all`](Self::remove_all) or on drop. A
/// partially built set (an `add` failed midway) therefore leaves nothing
/// registered behind it.
pub struct ListenerSet<T: ListenerTarget> {
    target: T,
    callbacks: Vec<(&'static str, T::Callback)>,
}

impl<T: ListenerTarget> ListenerSet<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            callbacks: Vec::new(),
        }
    }

    /// Register `callback` for `kind`. On error the callback is dropped
    /// unregistered.
    pub fn add(&mut self, kind: &'static str, callback: T::Callback) -> Result<(), T::Error> {
        self.target.add_listener(kind, &callback)?;
        self.callbacks.push((kind, callback));
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Unregister every listener. Idempotent.
    pub fn remove_all(&mut self) {
        for (kind, callback) in self.callbacks.drain(..) {
            if let Err(err) = self.target.remove_listener(kind, &callback) {
                tracing::warn!(kind, ?err, "failed to remove listener");
            }
        }
    }
}

impl<T: ListenerTarget> Drop for ListenerSet<T> {
    fn drop(&mut self) {
        self.remove_all();
    }
}

/// Deliver collected sink writes one by one while the controller stays
/// attached.
///
/// `is_attached` is checked before every write, so a callback that tears the
/// controller down stops the rest of the batch. Returns the number delivered.
pub fn deliver_while_attached<I, A, W>(writes: I, is_attached: A, mut write: W) -> usize
where
    I: IntoIterator<Item = String>,
    A: Fn() -> bool,
    W: FnMut(&str),
{
    let mut delivered = 0;
    for text in writes {
        if !is_attached() {
            tracing::debug!(delivered, "detached during delivery; remaining writes dropped");
            break;
        }
        write(&text);
        delivered += 1;
    }
    delivered
}
