//! Twilio SMS and WhatsApp notifier.

use std::time::Duration;

use async_trait::async_trait;
use forwardsflow_core::notify::{Channel, Notification, NotificationError, Notifier};
use forwardsflow_shared::NotifierConfig;
use reqwest::Client;
use tracing::debug;

use crate::mpesa::normalize_msisdn;

/// [`Notifier`] that posts to the Twilio Messages API.
pub struct TwilioNotifier {
    config: NotifierConfig,
    country_code: String,
    http: Client,
}

impl TwilioNotifier {
    /// Builds a notifier with its own HTTP client.
    ///
    /// `country_code` is used to turn national numbers into E.164.
    pub fn new(
        config: NotifierConfig,
        country_code: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            country_code: country_code.into(),
            http,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    /// Channel-specific address for a phone number.
    fn address(&self, channel: Channel, phone: &str) -> Result<String, NotificationError> {
        let msisdn = normalize_msisdn(phone, &self.country_code);
        if msisdn.is_empty() || !msisdn.chars().all(|c| c.is_ascii_digit()) {
            return Err(NotificationError::InvalidDestination(phone.to_string()));
        }
        Ok(match channel {
            Channel::Sms => format!("+{msisdn}"),
            Channel::WhatsApp => format!("whatsapp:+{msisdn}"),
        })
    }

    fn sender(&self, channel: Channel) -> String {
        let from = self.config.from_number.trim();
        match channel {
            Channel::WhatsApp if !from.starts_with("whatsapp:") => format!("whatsapp:{from}"),
            _ => from.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let to = self.address(notification.channel, &notification.destination)?;
        let from = self.sender(notification.channel);
        let form = [
            ("From", from.as_str()),
            ("To", to.as_str()),
            ("Body", notification.body.as_str()),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(channel = %notification.channel, "Twilio accepted message");
        Ok(())
    }
}
