//! Process-wide notification sink.
//!
//! Steps report outcomes here instead of rendering them. Subscribers (a UI,
//! the demo's printer, tests) receive every notification over a broadcast
//! channel; a bounded history keeps the most recent ones for late readers.

use crate::config::WizardConfig;
use crate::error::RemoteError;
use chrono::{DateTime, Utc};
use event_wizard_core::environment::Clock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;

/// Severity of a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Something worked
    Success,
    /// Something failed
    Error,
}

/// A transient message for the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// User-facing text
    pub message: String,
    /// When it was emitted
    pub at: DateTime<Utc>,
}

struct Inner {
    sender: broadcast::Sender<Notification>,
    history: Mutex<VecDeque<Notification>>,
    capacity: usize,
    dedupe: chrono::Duration,
    clock: Arc<dyn Clock>,
}

/// Notification sink shared by every clone
#[derive(Clone)]
pub struct FeedbackChannel {
    inner: Arc<Inner>,
}

impl FeedbackChannel {
    /// Create a channel keeping `capacity` notifications and dropping repeats
    /// within `dedupe`
    #[must_use]
    pub fn new(capacity: usize, dedupe: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);

        Self {
            inner: Arc::new(Inner {
                sender,
                history: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                dedupe: chrono::Duration::from_std(dedupe)
                    .unwrap_or_else(|_| chrono::Duration::days(365)),
                clock,
            }),
        }
    }

    /// Create a channel sized by configuration
    #[must_use]
    pub fn from_config(config: &WizardConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.feedback_capacity, config.feedback_dedupe(), clock)
    }

    /// Report a success. Returns false if the notification was deduplicated.
    pub fn success(&self, message: impl Into<String>) -> bool {
        self.notify(NotificationLevel::Success, message.into())
    }

    /// Report a failed remote action.
    ///
    /// The cause is logged; the notification carries `context` and the
    /// error's user-facing message.
    pub fn error(&self, context: &str, error: &RemoteError) -> bool {
        tracing::error!(kind = error.kind(), %error, "{context}");
        self.notify(
            NotificationLevel::Error,
            format!("{context}. {}", error.user_message()),
        )
    }

    /// Report a failure that did not come from the backend.
    pub fn reject(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        tracing::warn!(%message, "Rejected user action");
        self.notify(NotificationLevel::Error, message)
    }

    /// Emit a notification unless it repeats the last one within the dedupe window.
    pub fn notify(&self, level: NotificationLevel, message: String) -> bool {
        let now = self.inner.clock.now();
        let mut history = self
            .inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let repeated = history.back().is_some_and(|last| {
            last.level == level && last.message == message && now - last.at < self.inner.dedupe
        });
        if repeated {
            tracing::trace!(%message, "Dropped repeated notification");
            return false;
        }

        let notification = Notification {
            level,
            message,
            at: now,
        };

        if history.len() == self.inner.capacity {
            history.pop_front();
        }
        history.push_back(notification.clone());

        // No subscribers is fine; history still has it.
        let _ = self.inner.sender.send(notification);
        true
    }

    /// Receive every notification emitted from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.sender.subscribe()
    }

    /// Recent notifications, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<Notification> {
        self.inner
            .history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_else(|poisoned| poisoned.into_inner().iter().cloned().collect())
    }

    /// Most recent notification
    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.history().pop()
    }
}

impl std::fmt::Debug for FeedbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackChannel")
            .field("capacity", &self.inner.capacity)
            .field("dedupe", &self.inner.dedupe)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_wizard_testing::{ManualClock, test_clock};

    fn channel(capacity: usize) -> (FeedbackChannel, ManualClock) {
        let clock = ManualClock::new(test_clock().now());
        let feedback = FeedbackChannel::new(capacity, Duration::from_secs(2), Arc::new(clock.clone()));
        (feedback, clock)
    }

    #[test]
    fn repeated_message_within_window_is_dropped() {
        let (feedback, clock) = channel(8);

        assert!(feedback.success("Event created successfully"));
        assert!(!feedback.success("Event created successfully"));

        clock.advance(chrono::Duration::seconds(3));
        assert!(feedback.success("Event created successfully"));
        assert_eq!(feedback.history().len(), 2);
    }

    #[test]
    fn different_level_is_not_a_repeat() {
        let (feedback, _clock) = channel(8);

        feedback.success("Saved");
        assert!(feedback.notify(NotificationLevel::Error, "Saved".to_string()));
    }

    #[test]
    fn history_is_bounded() {
        let (feedback, _clock) = channel(2);

        feedback.success("one");
        feedback.success("two");
        feedback.success("three");

        let messages: Vec<_> = feedback.history().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn error_combines_context_and_user_message() {
        let (feedback, _clock) = channel(4);

        feedback.error("Failed to create event", &RemoteError::Storage("bucket full".into()));

        let last = feedback.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(
            last.message,
            "Failed to create event. Could not upload image. Please try again."
        );
        assert!(!last.message.contains("bucket full"));
    }

    #[tokio::test]
    async fn subscribers_receive_notifications() {
        let (feedback, _clock) = channel(4);
        let mut rx = feedback.subscribe();

        feedback.success("Location saved");

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "Location saved");
        assert_eq!(received.at, test_clock().now());
    }
}
