//! Latest-value-replay broadcaster.
//!
//! `StateBus<T>` is the reactive primitive under the session store, the
//! loading signal and the notification slot: it caches the most recent
//! value and notifies observers synchronously, in subscription order. A new
//! observer is replayed the then-current value before it can miss a `set`.
//!
//! Observers run under the bus lock and must not call back into the same
//! bus (single-threaded cooperative model; a re-entrant call would
//! deadlock).

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Box<dyn FnMut(&T) + Send>;

struct BusInner<T> {
    current: T,
    next_id: u64,
    observers: Vec<(u64, Callback<T>)>,
}

pub struct StateBus<T> {
    inner: Arc<Mutex<BusInner<T>>>,
}

impl<T> Clone for StateBus<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Clone + Send + 'static> StateBus<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner { current: initial, next_id: 0, observers: Vec::new() })),
        }
    }

    /// Clone of the current value; synchronous, no suspension.
    pub fn get(&self) -> T {
        self.inner.lock().current.clone()
    }

    /// Replace the held value and notify all live observers in
    /// subscription order. No observer can read a stale value after this
    /// returns.
    pub fn set(&self, value: T) {
        let mut inner = self.inner.lock();
        inner.current = value;
        let BusInner { current, observers, .. } = &mut *inner;
        for (_, cb) in observers.iter_mut() {
            cb(current);
        }
    }

    /// Register an observer. The callback is invoked immediately with the
    /// then-current value, then once per subsequent `set` until the
    /// returned guard is dropped or cancelled.
    pub fn observe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        // Replay under the lock so no `set` can slip between replay and
        // registration.
        callback(&inner.current);
        inner.observers.push((id, Box::new(callback)));

        let weak: Weak<Mutex<BusInner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(strong) = weak.upgrade() {
                    strong.lock().observers.retain(|(oid, _)| *oid != id);
                }
            })),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

/// Guard for a `StateBus` observer; unregisters on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Stop receiving notifications. The underlying bus keeps working; any
    /// in-flight operation still completes and notifies the remaining
    /// observers.
    pub fn cancel(mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl FnMut(&i32) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &i32| sink.lock().push(*v))
    }

    #[test]
    fn replays_current_value_to_new_observer() {
        let bus = StateBus::new(7);
        let (seen, cb) = recorder();
        let _sub = bus.observe(cb);
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn notifies_in_subscription_order() {
        let bus = StateBus::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));
        let o1 = Arc::clone(&order);
        let o2 = Arc::clone(&order);
        let _a = bus.observe(move |v| o1.lock().push(("a", *v)));
        let _b = bus.observe(move |v| o2.lock().push(("b", *v)));
        order.lock().clear();
        bus.set(1);
        assert_eq!(*order.lock(), vec![("a", 1), ("b", 1)]);
    }

    #[test]
    fn cancelled_subscription_goes_quiet() {
        let bus = StateBus::new(0);
        let (seen, cb) = recorder();
        let sub = bus.observe(cb);
        bus.set(1);
        sub.cancel();
        bus.set(2);
        assert_eq!(*seen.lock(), vec![0, 1]);
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let bus = StateBus::new(0);
        {
            let (_seen, cb) = recorder();
            let _sub = bus.observe(cb);
            assert_eq!(bus.observer_count(), 1);
        }
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn get_reflects_latest_set() {
        let bus = StateBus::new("a".to_string());
        bus.set("b".to_string());
        assert_eq!(bus.get(), "b");
    }
}
