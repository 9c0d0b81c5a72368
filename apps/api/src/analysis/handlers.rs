//! Axum route handlers for the one-shot Analyze API.

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::Response,
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use tracing::error;

use crate::errors::AppError;
use crate::models::resume::ResumeInputs;
use crate::state::AppState;

pub const ANALYZE_INPUTS_REQUIRED: &str = "Resume and goals are required";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub feedback: String,
}

fn validate(inputs: &ResumeInputs) -> Result<(), AppError> {
    if inputs.is_complete() {
        Ok(())
    } else {
        Err(AppError::Validation(ANALYZE_INPUTS_REQUIRED.to_string()))
    }
}

/// POST /api/analyze
///
/// Returns the whole feedback document once generation finishes.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(inputs): Json<ResumeInputs>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    validate(&inputs)?;
    let feedback = state.generator.generate(&inputs).await?;
    Ok(Json(AnalyzeResponse { feedback }))
}

/// POST /api/analyze/stream
///
/// Streams the raw feedback text as it is generated. A failure after the
/// first byte ends the body early; there is no retry.
pub async fn handle_analyze_stream(
    State(state): State<AppState>,
    Json(inputs): Json<ResumeInputs>,
) -> Result<Response, AppError> {
    validate(&inputs)?;
    let chunks = state.generator.generate_stream(&inputs).await?.inspect(|chunk| {
        if let Err(e) = chunk {
            error!("Feedback stream aborted: {}", e);
        }
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(chunks))
        .map_err(|e| AppError::Internal(e.into()))
}
