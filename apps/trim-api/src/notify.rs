//! Customer notifications.
//!
//! Sending is best-effort: callers bound each attempt with a timeout and
//! log failures, and a failed notification never undoes the work that
//! triggered it.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Outbound channel for customer messages (email today).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// Sends one notification, waiting at most `timeout`.
///
/// Returns whether it was delivered. Failures are logged and swallowed.
pub async fn deliver(notifier: &dyn Notifier, timeout: Duration, notification: Notification) -> bool {
    let recipient = notification.recipient.clone();
    match tokio::time::timeout(timeout, notifier.send(notification)).await {
        Ok(Ok(())) => {
            debug!(recipient = %recipient, "Notification delivered");
            true
        }
        Ok(Err(e)) => {
            warn!(recipient = %recipient, error = %e, "Notification failed");
            false
        }
        Err(_) => {
            warn!(recipient = %recipient, timeout_ms = timeout.as_millis() as u64, "Notification timed out");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notification it is asked to send.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    /// Always fails.
    #[derive(Debug, Default)]
    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp unreachable".into()))
        }
    }

    /// Never finishes in time.
    #[derive(Debug, Default)]
    pub struct HangingNotifier;

    #[async_trait]
    impl Notifier for HangingNotifier {
        async fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }
}
