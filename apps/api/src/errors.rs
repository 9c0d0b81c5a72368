use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::payment::PaymentError;
use crate::wizard::store::StoreError;
use crate::wizard::WizardError;

/// Shown for any upstream generation failure. Causes are logged, never returned.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate feedback";
pub const AI_NOT_CONFIGURED_MESSAGE: &str = "AI service not configured";
pub const STORAGE_FAILED_MESSAGE: &str =
    "Failed to save your session. Please ensure storage is available.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Navigation into a paid step while locked.
    #[error("Locked: {0}")]
    Locked(String),

    #[error("Invalid transition: {0}")]
    Conflict(String),

    #[error("Payment not completed (status: {0})")]
    PaymentRequired(String),

    /// The payment already unlocked a different wizard.
    #[error("Payment {0} already used")]
    PaymentAlreadyUsed(String),

    #[error("Payment verification not configured")]
    PaymentNotConfigured,

    #[error("Payment verification failed: {0}")]
    PaymentUnavailable(String),

    #[error("AI service not configured")]
    AiNotConfigured,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => AppError::AiNotConfigured,
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured => AppError::PaymentNotConfigured,
            PaymentError::NotCompleted { payment_status } => {
                AppError::PaymentRequired(payment_status)
            }
            other => AppError::PaymentUnavailable(other.to_string()),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Locked { .. } => AppError::Locked(err.to_string()),
            WizardError::PaymentNotCompleted { payment_status } => {
                AppError::PaymentRequired(payment_status)
            }
            WizardError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
            ),
            AppError::Locked(_) => (
                StatusCode::FORBIDDEN,
                "LOCKED",
                "Unlock the full analysis to view this step.".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone()),
            AppError::PaymentRequired(status) => (
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_NOT_COMPLETED",
                format!("Payment has not been completed (status: {status})."),
            ),
            AppError::PaymentAlreadyUsed(_) => (
                StatusCode::CONFLICT,
                "PAYMENT_ALREADY_USED",
                "This payment has already unlocked another analysis.".to_string(),
            ),
            AppError::PaymentNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PAYMENT_NOT_CONFIGURED",
                "Payment system not configured".to_string(),
            ),
            AppError::PaymentUnavailable(msg) => {
                tracing::error!("Payment verification error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_VERIFICATION_FAILED",
                    "Unable to verify payment.".to_string(),
                )
            }
            AppError::AiNotConfigured => {
                tracing::error!("GEMINI_API_KEY not set");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI_NOT_CONFIGURED",
                    AI_NOT_CONFIGURED_MESSAGE.to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    GENERATION_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INSUFFICIENT_STORAGE,
                    "STORAGE_ERROR",
                    STORAGE_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
