//! Typed event emitters.
//!
//! An [`Emitter`] maintains an ordered observer list. Listeners are invoked
//! synchronously, in registration order, each time [`Emitter::emit`] is
//! called. Subscribing returns a [`Subscription`] whose disposal removes
//! exactly that listener.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::disposable::Disposable;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Hook = Box<dyn Fn() + Send + Sync>;

struct EmitterInner<T> {
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
    /// Called when the listener list goes from empty to non-empty.
    on_first_listener: Mutex<Option<Hook>>,
    /// Called when the listener list goes from non-empty to empty.
    on_last_listener: Mutex<Option<Hook>>,
}

/// A multi-listener event source.
///
/// Cheap to clone; clones share the same listener list.
pub struct Emitter<T> {
    inner: Arc<EmitterInner<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Subscriptions capture a `Weak` to the inner state inside a `'static`
// cleanup closure, so the payload type must not borrow.
impl<T: 'static> Emitter<T> {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                on_first_listener: Mutex::new(None),
                on_last_listener: Mutex::new(None),
            }),
        }
    }

    /// Install lazy-acquisition hooks.
    ///
    /// `on_first` fires when the list transitions from empty to non-empty,
    /// `on_last` when it transitions back to empty. Used to acquire and
    /// release an underlying resource only while someone is listening.
    pub fn set_listener_hooks(
        &self,
        on_first: impl Fn() + Send + Sync + 'static,
        on_last: impl Fn() + Send + Sync + 'static,
    ) {
        *self.inner.on_first_listener.lock().unwrap() = Some(Box::new(on_first));
        *self.inner.on_last_listener.lock().unwrap() = Some(Box::new(on_last));
    }

    /// Register a listener. The returned [`Subscription`] unregisters it.
    pub fn listen(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let was_empty = {
            let mut listeners = self.inner.listeners.lock().unwrap();
            let was_empty = listeners.is_empty();
            listeners.push((id, Arc::new(listener)));
            was_empty
        };
        if was_empty {
            if let Some(hook) = self.inner.on_first_listener.lock().unwrap().as_ref() {
                hook();
            }
        }

        let weak: Weak<EmitterInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            guard: Disposable::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let now_empty = {
                        let mut listeners = inner.listeners.lock().unwrap();
                        listeners.retain(|(entry_id, _)| *entry_id != id);
                        listeners.is_empty()
                    };
                    if now_empty {
                        if let Some(hook) = inner.on_last_listener.lock().unwrap().as_ref() {
                            hook();
                        }
                    }
                }
            }),
        }
    }

    /// Invoke all listeners with `value`, in registration order.
    ///
    /// Listeners are called outside the internal lock so a listener may
    /// register or dispose subscriptions on this emitter.
    pub fn emit(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().unwrap().len()
    }
}

impl<T: 'static> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Handle to a registered listener. Disposal (or drop) unregisters it.
#[derive(Debug)]
pub struct Subscription {
    guard: Disposable,
}

impl Subscription {
    /// Unregister the listener now. Idempotent.
    pub fn dispose(&mut self) {
        self.guard.dispose();
    }

    /// Whether the listener has been unregistered.
    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }

    /// Convert into a plain [`Disposable`] for collection in a
    /// [`crate::disposable::DisposableCollection`].
    pub fn into_disposable(mut self) -> Disposable {
        std::mem::replace(&mut self.guard, Disposable::noop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emit_reaches_listener() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = emitter.listen(move |value| seen_clone.lock().unwrap().push(*value));

        emitter.emit(&1);
        emitter.emit(&2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let emitter: Emitter<()> = Emitter::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Vec::new();
        for i in 0..3 {
            let order = order.clone();
            subs.push(emitter.listen(move |()| order.lock().unwrap().push(i)));
        }
        emitter.emit(&());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dispose_removes_exactly_that_listener() {
        let emitter: Emitter<()> = Emitter::new();
        let count_a = Arc::new(AtomicUsize::new(0));
        let count_b = Arc::new(AtomicUsize::new(0));
        let a = count_a.clone();
        let b = count_b.clone();
        let mut sub_a = emitter.listen(move |()| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let _sub_b = emitter.listen(move |()| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&());
        sub_a.dispose();
        emitter.emit(&());

        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(count_b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let emitter: Emitter<()> = Emitter::new();
        {
            let _sub = emitter.listen(|()| {});
            assert_eq!(emitter.listener_count(), 1);
        }
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        let emitter: Emitter<String> = Emitter::new();
        emitter.emit(&"nobody home".to_string());
    }

    #[test]
    fn first_and_last_listener_hooks() {
        let emitter: Emitter<()> = Emitter::new();
        let first = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let first_clone = first.clone();
        let last_clone = last.clone();
        emitter.set_listener_hooks(
            move || {
                first_clone.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                last_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        let mut sub_a = emitter.listen(|()| {});
        let mut sub_b = emitter.listen(|()| {});
        assert_eq!(first.load(Ordering::SeqCst), 1);

        sub_a.dispose();
        assert_eq!(last.load(Ordering::SeqCst), 0);
        sub_b.dispose();
        assert_eq!(last.load(Ordering::SeqCst), 1);

        // A fresh listener fires the first-listener hook again.
        let _sub_c = emitter.listen(|()| {});
        assert_eq!(first.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_may_dispose_other_subscription_during_emit() {
        let emitter: Emitter<()> = Emitter::new();
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let victim_clone = victim.clone();
        let _killer = emitter.listen(move |()| {
            if let Some(mut sub) = victim_clone.lock().unwrap().take() {
                sub.dispose();
            }
        });
        *victim.lock().unwrap() = Some(emitter.listen(|()| {}));

        assert_eq!(emitter.listener_count(), 2);
        emitter.emit(&());
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn clones_share_listeners() {
        let emitter: Emitter<u32> = Emitter::new();
        let clone = emitter.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let _sub = clone.listen(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        emitter.emit(&7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_into_disposable_keeps_registration_until_disposed() {
        let emitter: Emitter<()> = Emitter::new();
        let sub = emitter.listen(|()| {});
        let mut disposable = sub.into_disposable();
        assert_eq!(emitter.listener_count(), 1);
        disposable.dispose();
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn emitter_debug() {
        let emitter: Emitter<()> = Emitter::new();
        let debug = format!("{:?}", emitter);
        assert!(debug.contains("Emitter"));
    }
}
