//! Payment gateway capability.
//!
//! The ledger talks to the mobile-money provider only through
//! [`PaymentGateway`]. Provider callbacks are normalized into a
//! [`CallbackResult`] before they reach the settlement path.

pub mod callback;
mod error;
mod gateway;

pub use callback::{CallbackResult, parse_callback};
pub use error::{CallbackError, GatewayError};
pub use gateway::{CollectionRequest, DisbursementRequest, PaymentAck, PaymentGateway};
