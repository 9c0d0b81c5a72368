//! Axum route handlers for email capture and the admin export.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::subscriber::SubscriberRow;
use crate::state::AppState;
use crate::subscribers::repository::{
    count_subscribers, list_subscribers, save_email, NewSubscriber, SaveOutcome, DEFAULT_SOURCE,
};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

const UNKNOWN: &str = "unknown";
const CSV_HEADER: &str = "ID,Email,Source,Created At,IP Address";

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdminEmailsQuery {
    pub limit: Option<i64>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminEmailsResponse {
    pub success: bool,
    pub count: i64,
    pub emails: Vec<SubscriberRow>,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First hop of `x-forwarded-for`, then `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> &str {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .unwrap_or(UNKNOWN)
}

fn is_authorized(headers: &HeaderMap, admin_key: &str) -> bool {
    header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|key| key == admin_key)
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn to_csv(rows: &[SubscriberRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for row in rows {
        lines.push(format!(
            "{},{},{},{},{}",
            row.id,
            csv_field(&row.email),
            csv_field(&row.source),
            csv_field(&row.created_at.to_rfc3339()),
            csv_field(row.ip_address.as_deref().unwrap_or_default()),
        ));
    }
    lines.join("\n")
}

/// POST /api/subscribe
///
/// Duplicate addresses answer 200 so the form never shows an error for them.
pub async fn handle_subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, AppError> {
    let email = request
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    let subscriber = NewSubscriber {
        email: &email,
        source: DEFAULT_SOURCE,
        ip_address: Some(client_ip(&headers)),
        user_agent: Some(header_str(&headers, header::USER_AGENT.as_str()).unwrap_or(UNKNOWN)),
    };

    let response = match save_email(&state.db, &subscriber).await? {
        SaveOutcome::Created { id } => {
            info!("New subscriber {}", id);
            SubscribeResponse {
                success: Some(true),
                message: "Thank you for subscribing!",
                id: Some(id),
            }
        }
        SaveOutcome::AlreadySubscribed => SubscribeResponse {
            success: None,
            message: "You are already subscribed!",
            id: None,
        },
    };
    Ok(Json(response))
}

/// GET /api/admin/emails?limit=&format=json|csv
pub async fn handle_admin_emails(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminEmailsQuery>,
) -> Result<Response, AppError> {
    if !is_authorized(&headers, &state.config.admin_api_key) {
        return Err(AppError::Unauthorized);
    }

    let emails = list_subscribers(&state.db, query.limit).await?;

    if query.format.as_deref() == Some("csv") {
        let filename = format!("emails-{}.csv", Utc::now().format("%Y-%m-%d"));
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            to_csv(&emails),
        )
            .into_response());
    }

    let count = count_subscribers(&state.db).await?;
    Ok(Json(AdminEmailsResponse {
        success: true,
        count,
        emails,
    })
    .into_response())
}
