//! Safaricom M-Pesa Daraja adapter.
//!
//! Disbursements use the B2C `BusinessPayment` command; collections use
//! Lipa Na M-Pesa Online (STK push). Both authenticate with an OAuth
//! client-credentials token that is cached until shortly before expiry.

mod client;
mod payload;
mod phone;
mod token;

pub use client::MpesaGateway;
pub use phone::normalize_msisdn;
