//! Application configuration management.
//!
//! Built once at process start and injected, immutable, into the payment
//! gateway and notifier adapters.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Mobile-money provider configuration.
    pub mpesa: MpesaConfig,
    /// Borrower notification channel configuration.
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// M-Pesa Daraja configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MpesaConfig {
    /// API base URL (sandbox or production).
    #[serde(default = "default_mpesa_base_url")]
    pub base_url: String,
    /// OAuth consumer key.
    pub consumer_key: String,
    /// OAuth consumer secret.
    pub consumer_secret: String,
    /// Business shortcode (paybill) used for both directions.
    pub shortcode: String,
    /// Lipa Na M-Pesa passkey for STK push passwords.
    pub passkey: String,
    /// B2C initiator name.
    #[serde(default)]
    pub initiator_name: String,
    /// B2C encrypted security credential.
    #[serde(default)]
    pub security_credential: String,
    /// Public base URL the provider calls back on.
    pub callback_url: String,
    /// Country code substituted for a leading national trunk prefix.
    #[serde(default = "default_country_code")]
    pub country_code: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How long a fetched access token is reused, in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_mpesa_base_url() -> String {
    "https://api.safaricom.co.ke".to_string()
}

fn default_country_code() -> String {
    "254".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_token_ttl() -> u64 {
    3300 // provider tokens live 3599 seconds
}

/// Notification delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Plain SMS.
    Sms,
    /// WhatsApp chat message.
    #[default]
    Whatsapp,
}

/// Notifier (Twilio) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// When false, messages are only logged.
    #[serde(default)]
    pub enabled: bool,
    /// Default delivery channel.
    #[serde(default)]
    pub channel: ChannelKind,
    /// API base URL.
    #[serde(default = "default_twilio_base_url")]
    pub base_url: String,
    /// Account SID.
    #[serde(default)]
    pub account_sid: String,
    /// Auth token.
    #[serde(default)]
    pub auth_token: String,
    /// Sender number in international format.
    #[serde(default)]
    pub from_number: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_notifier_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel: ChannelKind::default(),
            base_url: default_twilio_base_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            request_timeout_secs: default_notifier_timeout(),
        }
    }
}

fn default_twilio_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_notifier_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("FORWARDSFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
