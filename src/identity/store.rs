use crate::bus::{StateBus, Subscription};

use super::session::Session;

/// Holds the current authenticated identity, or none.
///
/// Pure state holding with latest-value-replay observation; all mutation
/// goes through [`set`](Self::set), which notifies observers synchronously
/// and in subscription order.
pub struct SessionStore {
    bus: StateBus<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { bus: StateBus::new(None) }
    }

    /// The held session, live or not; synchronous, no suspension.
    pub fn current(&self) -> Option<Session> {
        self.bus.get()
    }

    /// The held session only when it has not expired. Anything that
    /// authorizes on the session goes through here — an expired session
    /// must never be treated as authenticated.
    pub fn live(&self) -> Option<Session> {
        self.bus.get().filter(|s| s.is_live())
    }

    pub fn email(&self) -> Option<String> {
        self.current().map(|s| s.email)
    }

    pub fn identity_id(&self) -> Option<String> {
        self.current().map(|s| s.identity_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.live().is_some()
    }

    /// Atomically replace the held value and notify all observers.
    pub fn set(&self, session: Option<Session>) {
        self.bus.set(session);
    }

    /// Replay-then-follow subscription: the callback sees the then-current
    /// value immediately, then every subsequent change until the guard is
    /// dropped.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Option<Session>) + Send + 'static,
    {
        self.bus.observe(callback)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
