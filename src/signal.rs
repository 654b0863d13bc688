//! Reference-counted in-flight-work indicator.
//!
//! Any component about to perform a remote call acquires the signal and
//! releases it on completion; the broadcast boolean is `counter > 0`, so
//! two overlapping operations' loading windows compose correctly. A plain
//! boolean would hide the spinner as soon as the first of two concurrent
//! operations finished.

use parking_lot::Mutex;

use crate::bus::{StateBus, Subscription};

pub struct LoadingSignal {
    count: Mutex<u32>,
    bus: StateBus<bool>,
}

impl LoadingSignal {
    pub fn new() -> Self {
        Self { count: Mutex::new(0), bus: StateBus::new(false) }
    }

    /// Increment the in-flight counter; broadcasts `true` on the 0→1
    /// transition only.
    pub fn acquire(&self) {
        let rose = {
            let mut count = self.count.lock();
            *count += 1;
            *count == 1
        };
        if rose {
            self.bus.set(true);
        }
    }

    /// Decrement the counter, clamped at zero; broadcasts `false` on the
    /// 1→0 transition only. Every `acquire` must be matched by exactly one
    /// `release` on every exit path of the caller's operation.
    pub fn release(&self) {
        let fell = {
            let mut count = self.count.lock();
            if *count == 0 {
                return;
            }
            *count -= 1;
            *count == 0
        };
        if fell {
            self.bus.set(false);
        }
    }

    /// Escape hatch for error paths that lost track of their pairing:
    /// forces the counter to zero and broadcasts `false` unconditionally.
    pub fn reset(&self) {
        *self.count.lock() = 0;
        self.bus.set(false);
    }

    /// RAII pairing: the returned guard releases on drop, covering every
    /// exit path of the caller including `?`.
    pub fn guard(&self) -> LoadGuard<'_> {
        self.acquire();
        LoadGuard { signal: self }
    }

    pub fn is_loading(&self) -> bool {
        self.bus.get()
    }

    pub fn in_flight(&self) -> u32 {
        *self.count.lock()
    }

    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&bool) + Send + 'static,
    {
        self.bus.observe(callback)
    }
}

impl Default for LoadingSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LoadGuard<'a> {
    signal: &'a LoadingSignal,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.signal.release();
    }
}
