//! Single-slot transient user notifications.
//!
//! At most one notification is live at a time; publishing replaces the
//! previous one regardless of its remaining duration. A notification with
//! a duration arms a one-shot auto-dismiss timer; publishing or
//! dismissing while a timer is pending cancels it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::bus::{StateBus, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub kind: NotifyKind,
    /// Auto-dismiss delay; `None` never auto-dismisses and the caller must
    /// dismiss explicitly.
    pub duration_ms: Option<u64>,
}

impl Notification {
    pub fn new<S: Into<String>>(kind: NotifyKind, text: S, duration_ms: Option<u64>) -> Self {
        Self { text: text.into(), kind, duration_ms }
    }

    pub fn success<S: Into<String>>(text: S, duration_ms: u64) -> Self {
        Self::new(NotifyKind::Success, text, Some(duration_ms))
    }

    pub fn error<S: Into<String>>(text: S, duration_ms: u64) -> Self {
        Self::new(NotifyKind::Error, text, Some(duration_ms))
    }
}

struct DismissTimer {
    /// Bumped on every publish/dismiss; a woken timer task only dismisses
    /// when its generation is still current, so a stale timer can never
    /// clear a newer notification.
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

pub struct Notifier {
    bus: StateBus<Option<Notification>>,
    timer: Arc<Mutex<DismissTimer>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            bus: StateBus::new(None),
            timer: Arc::new(Mutex::new(DismissTimer { generation: 0, handle: None })),
        }
    }

    /// Store the notification as current, notify observers, and arm the
    /// auto-dismiss timer when a duration is present. Any pending timer is
    /// cancelled first.
    pub fn publish(&self, notification: Notification) {
        let generation = {
            let mut timer = self.timer.lock();
            timer.generation += 1;
            if let Some(handle) = timer.handle.take() {
                handle.abort();
            }
            timer.generation
        };
        let duration_ms = notification.duration_ms;
        self.bus.set(Some(notification));

        if let Some(ms) = duration_ms {
            let bus = self.bus.clone();
            let timer = Arc::clone(&self.timer);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                {
                    let mut timer = timer.lock();
                    if timer.generation != generation {
                        return;
                    }
                    timer.handle = None;
                }
                bus.set(None);
            });
            let mut timer = self.timer.lock();
            if timer.generation == generation {
                timer.handle = Some(handle);
            } else {
                // a publish/dismiss raced in before we parked the handle
                handle.abort();
            }
        }
    }

    /// Clear the slot, notify observers and cancel any pending timer.
    pub fn dismiss(&self) {
        {
            let mut timer = self.timer.lock();
            timer.generation += 1;
            if let Some(handle) = timer.handle.take() {
                handle.abort();
            }
        }
        self.bus.set(None);
    }

    pub fn current(&self) -> Option<Notification> {
        self.bus.get()
    }

    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Option<Notification>) + Send + 'static,
    {
        self.bus.observe(callback)
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_replaces_previous_notification() {
        let notifier = Notifier::new();
        notifier.publish(Notification::new(NotifyKind::Info, "first", None));
        notifier.publish(Notification::new(NotifyKind::Error, "second", None));
        let current = notifier.current().unwrap();
        assert_eq!(current.text, "second");
        assert_eq!(current.kind, NotifyKind::Error);
    }

    #[test]
    fn dismiss_clears_slot() {
        let notifier = Notifier::new();
        notifier.publish(Notification::new(NotifyKind::Success, "done", None));
        notifier.dismiss();
        assert!(notifier.current().is_none());
    }

    #[tokio::test]
    async fn timer_auto_dismisses() {
        let notifier = Notifier::new();
        notifier.publish(Notification::success("saved", 30));
        assert!(notifier.current().is_some());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test]
    async fn new_publish_cancels_pending_timer() {
        let notifier = Notifier::new();
        notifier.publish(Notification::success("short lived", 40));
        notifier.publish(Notification::new(NotifyKind::Warning, "sticky", None));
        tokio::time::sleep(Duration::from_millis(150)).await;
        // the first timer must not have cleared the replacement
        let current = notifier.current().unwrap();
        assert_eq!(current.text, "sticky");
    }

    #[tokio::test]
    async fn untimed_notification_never_auto_dismisses() {
        let notifier = Notifier::new();
        notifier.publish(Notification::new(NotifyKind::Info, "pinned", None));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(notifier.current().is_some());
    }

    #[tokio::test]
    async fn dismiss_cancels_pending_timer() {
        let notifier = Notifier::new();
        notifier.publish(Notification::success("soon gone", 40));
        notifier.dismiss();
        notifier.publish(Notification::new(NotifyKind::Info, "fresh", None));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(notifier.current().unwrap().text, "fresh");
    }

    #[tokio::test]
    async fn observers_see_publish_and_dismiss() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = notifier.observe(move |n| sink.lock().push(n.as_ref().map(|n| n.text.clone())));
        notifier.publish(Notification::new(NotifyKind::Info, "hello", None));
        notifier.dismiss();
        assert_eq!(*seen.lock(), vec![None, Some("hello".to_string()), None]);
    }
}
