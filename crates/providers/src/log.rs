//! Notifier that writes messages to the log instead of sending them.

use async_trait::async_trait;
use forwardsflow_core::notify::{Notification, NotificationError, Notifier};
use tracing::info;

/// Used when outbound notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            channel = %notification.channel,
            template = ?notification.template,
            body = %notification.body,
            "Notification (not sent)"
        );
        Ok(())
    }
}
