//! Borrower registration routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use forwardsflow_core::ledger::{Borrower, NewBorrower};
use forwardsflow_shared::types::BorrowerId;

use crate::{ApiError, AppState, middleware::Caller};

/// Creates the borrower routes (requires caller middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/borrowers", post(register_borrower))
        .route("/borrowers/{borrower_id}", get(get_borrower))
}

/// POST /borrowers
async fn register_borrower(
    State(state): State<AppState>,
    _caller: Caller,
    Json(input): Json<NewBorrower>,
) -> Result<(StatusCode, Json<Borrower>), ApiError> {
    let borrower = state.ledger.register_borrower(input).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}

/// GET /borrowers/{borrower_id}
async fn get_borrower(
    State(state): State<AppState>,
    _caller: Caller,
    Path(borrower_id): Path<String>,
) -> Result<Json<Borrower>, ApiError> {
    let borrower = state.ledger.borrower(&BorrowerId::from(borrower_id)).await?;
    Ok(Json(borrower))
}
