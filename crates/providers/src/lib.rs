//! External provider adapters for ForwardsFlow.
//!
//! - `mpesa` - Safaricom Daraja implementation of the payment gateway
//! - `twilio` - Twilio SMS/WhatsApp implementation of the notifier
//! - `log` - Notifier that only writes to the log

pub mod log;
pub mod mpesa;
pub mod twilio;

pub use log::LogNotifier;
pub use mpesa::MpesaGateway;
pub use twilio::TwilioNotifier;

use forwardsflow_core::payment::GatewayError;

/// Maps a transport failure to a gateway error.
pub(crate) fn transport_error(err: &reqwest::Error, timeout_secs: u64) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout_secs)
    } else {
        GatewayError::Network(err.to_string())
    }
}
