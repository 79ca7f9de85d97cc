//! Fire-and-forget notification dispatch.

use std::sync::Arc;

use tracing::{debug, warn};

use super::template::{NotificationParams, NotificationTemplate};
use super::{Channel, Notification, Notifier};

/// Renders templates and sends them on background tasks.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    default_channel: Channel,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over a transport.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, default_channel: Channel) -> Self {
        Self {
            notifier,
            default_channel,
        }
    }

    /// Channel used when the caller has no preference.
    #[must_use]
    pub const fn default_channel(&self) -> Channel {
        self.default_channel
    }

    /// Renders `template` and sends it without waiting for the result.
    ///
    /// Must be called from within a Tokio runtime. Delivery is attempted once;
    /// a failure is logged and never reported back to the caller.
    pub fn notify(
        &self,
        channel: Channel,
        destination: &str,
        template: NotificationTemplate,
        params: &NotificationParams,
    ) {
        let notification = Notification {
            channel,
            destination: destination.to_string(),
            template,
            body: template.render(params),
        };
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            match notifier.send(&notification).await {
                Ok(()) => debug!(
                    channel = %notification.channel,
                    template = ?notification.template,
                    "Notification sent"
                ),
                Err(e) => warn!(
                    channel = %notification.channel,
                    template = ?notification.template,
                    error_code = e.error_code(),
                    error = %e,
                    "Notification failed"
                ),
            }
        });
    }
}
