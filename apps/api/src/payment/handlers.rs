//! Axum route handlers for payment-related flags.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetaStatusResponse {
    pub beta_mode: bool,
}

/// GET /api/beta-status
pub async fn handle_beta_status(State(state): State<AppState>) -> Json<BetaStatusResponse> {
    Json(BetaStatusResponse {
        beta_mode: state.config.beta_mode,
    })
}
