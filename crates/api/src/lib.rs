//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for borrowers, loan decisions and payments
//! - Provider callback endpoints
//! - Caller identity middleware
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use forwardsflow_core::ledger::LoanLedger;
use forwardsflow_core::settlement::SettlementReconciler;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loan lifecycle service.
    pub ledger: LoanLedger,
    /// Provider callback handler.
    pub reconciler: SettlementReconciler,
}

impl AppState {
    /// Builds the state around a ledger, deriving the reconciler from it.
    #[must_use]
    pub fn new(ledger: LoanLedger) -> Self {
        let reconciler = SettlementReconciler::new(ledger.clone());
        Self { ledger, reconciler }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
