//! Payment provider callback endpoints.
//!
//! Every callback is answered 200 with the provider acknowledgment, whatever
//! the payload, so the provider stops redelivering.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    routing::post,
};
use forwardsflow_core::settlement::CallbackAck;
use serde_json::Value;
use tracing::warn;

use crate::AppState;

/// Creates the callback routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/callbacks/mpesa", post(stk_callback))
        .route("/callbacks/mpesa/result", post(b2c_result))
        .route("/callbacks/mpesa/timeout", post(b2c_timeout))
}

async fn reconcile(state: &AppState, route: &'static str, body: &[u8]) -> Json<CallbackAck> {
    match serde_json::from_slice::<Value>(body) {
        Ok(payload) => Json(state.reconciler.handle_callback(&payload).await),
        Err(e) => {
            warn!(route, error = %e, "MalformedCallback");
            Json(CallbackAck::accepted())
        }
    }
}

/// POST /callbacks/mpesa
async fn stk_callback(State(state): State<AppState>, body: Bytes) -> Json<CallbackAck> {
    reconcile(&state, "stk", &body).await
}

/// POST /callbacks/mpesa/result
async fn b2c_result(State(state): State<AppState>, body: Bytes) -> Json<CallbackAck> {
    reconcile(&state, "b2c_result", &body).await
}

/// POST /callbacks/mpesa/timeout
///
/// The provider gave up on a queued disbursement; the payload carries the
/// B2C result shape with a failure code.
async fn b2c_timeout(State(state): State<AppState>, body: Bytes) -> Json<CallbackAck> {
    warn!("B2C request timed out in provider queue");
    reconcile(&state, "b2c_timeout", &body).await
}
