//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::caller_middleware};

pub mod borrowers;
pub mod callbacks;
pub mod health;
pub mod loans;

/// Creates the API router.
///
/// Health and provider callbacks are public; everything else needs a
/// caller identity.
pub fn api_routes() -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(borrowers::routes())
        .merge(loans::routes())
        .layer(middleware::from_fn(caller_middleware));

    Router::new()
        .merge(health::routes())
        .merge(callbacks::routes())
        .merge(protected_routes)
}
