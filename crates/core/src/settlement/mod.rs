//! Settlement reconciliation.
//!
//! Turns raw provider callbacks into ledger settlements. The provider only
//! ever sees an acknowledgment; anything that goes wrong here is logged.

mod error;
mod reconciler;


pub use error::ReconcileError;
pub use reconciler::{CallbackAck, SettlementReconciler};
