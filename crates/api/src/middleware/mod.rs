//! Request middleware.

pub mod auth;

pub use auth::{Caller, CallerRole, caller_middleware};
