//! Shared types, errors, and configuration for ForwardsFlow.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for loans, borrowers, transactions, and payments
//! - Shilling amount helpers with decimal precision
//! - Caller error types for the HTTP boundary
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ChannelKind, MpesaConfig, NotifierConfig, ServerConfig};
pub use error::AppError;
