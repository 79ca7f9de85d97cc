//! Borrower notifications.
//!
//! Best-effort delivery: the ledger hands a rendered message to the
//! [`NotificationDispatcher`] after its state change is committed, and the
//! dispatcher sends it on a background task. Failures are logged and dropped.

mod dispatcher;
mod error;
mod template;

pub use dispatcher::NotificationDispatcher;
pub use error::NotificationError;
pub use template::{NotificationParams, NotificationTemplate};

use async_trait::async_trait;
use forwardsflow_shared::ChannelKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Plain SMS.
    Sms,
    /// WhatsApp message.
    WhatsApp,
}

impl Channel {
    /// Returns the string representation of the channel.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::WhatsApp => "whatsapp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ChannelKind> for Channel {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Sms => Self::Sms,
            ChannelKind::Whatsapp => Self::WhatsApp,
        }
    }
}

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Delivery channel.
    pub channel: Channel,
    /// Recipient phone number, as stored on the borrower.
    pub destination: String,
    /// Template the body was rendered from.
    pub template: NotificationTemplate,
    /// Message text.
    pub body: String,
}

/// Outbound message transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a single message.
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}
