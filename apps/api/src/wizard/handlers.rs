//! Axum route handlers for the Wizard API.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeInputs;
use crate::payment::VerificationRequest;
use crate::state::AppState;
use crate::wizard::driver::run_generation;
use crate::wizard::machine::{Direction, WizardEvent, WizardSnapshot, WizardState};

pub const INPUTS_REQUIRED_MESSAGE: &str = "Please provide your resume and career goals.";
pub const WIZARD_ID_HEADER: &str = "x-wizard-id";

const MAX_WIZARD_ID_LEN: usize = 64;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWizardRequest {
    #[serde(default)]
    pub wizard_id: Option<String>,
    #[serde(flatten)]
    pub inputs: ResumeInputs,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Direction,
}

fn is_valid_wizard_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_WIZARD_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn load_state(state: &AppState, wizard_id: &str) -> Result<WizardState, AppError> {
    state
        .store
        .load(wizard_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Wizard {wizard_id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/wizard
///
/// Starts (or restarts) a generation and streams progress as NDJSON, one
/// event per line. The wizard id is echoed in the `x-wizard-id` header.
pub async fn handle_start_wizard(
    State(state): State<AppState>,
    Json(request): Json<StartWizardRequest>,
) -> Result<Response, AppError> {
    if !request.inputs.is_complete() {
        return Err(AppError::Validation(INPUTS_REQUIRED_MESSAGE.to_string()));
    }

    let wizard_id = match request.wizard_id.filter(|id| !id.trim().is_empty()) {
        Some(id) if is_valid_wizard_id(&id) => id,
        Some(_) => return Err(AppError::Validation("Invalid wizard id".to_string())),
        None => Uuid::new_v4().to_string(),
    };
    info!(
        "Starting wizard {} (tailored={})",
        wizard_id,
        request.inputs.has_requirements()
    );

    let events = run_generation(
        state.generator.clone(),
        state.store.clone(),
        wizard_id.clone(),
        request.inputs,
    )
    .map(|event| {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        Ok::<_, serde_json::Error>(Bytes::from(line))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(WIZARD_ID_HEADER, wizard_id)
        .body(Body::from_stream(events))
        .map_err(|e| AppError::Internal(e.into()))
}

/// GET /api/wizard/:wizard_id
pub async fn handle_get_wizard(
    State(state): State<AppState>,
    Path(wizard_id): Path<String>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = load_state(&state, &wizard_id).await?;
    Ok(Json(wizard.snapshot(&wizard_id)))
}

/// POST /api/wizard/:wizard_id/navigate
///
/// Load → reduce → save. Concurrent navigations are last-writer-wins.
pub async fn handle_navigate(
    State(state): State<AppState>,
    Path(wizard_id): Path<String>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = load_state(&state, &wizard_id).await?;
    let next = wizard.apply(WizardEvent::Navigate(request.direction))?;
    state.store.save(&wizard_id, &next).await?;
    Ok(Json(next.snapshot(&wizard_id)))
}

/// POST /api/wizard/:wizard_id/unlock
///
/// Verifies the payment and unlocks the gated sections. The wizard moves to
/// the details step. A payment unlocks exactly one wizard; presenting it again
/// for another wizard is a conflict.
pub async fn handle_unlock(
    State(state): State<AppState>,
    Path(wizard_id): Path<String>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    if request.is_blank() {
        return Err(AppError::Validation("Session ID is required".to_string()));
    }

    let wizard = load_state(&state, &wizard_id).await?;
    let verification = state.payments.verify(&request).await?;
    let next = wizard.apply(WizardEvent::PaymentConfirmed {
        verification,
        reference: request.reference().to_string(),
        at: Utc::now(),
    })?;

    let owner = state
        .store
        .claim_payment(request.reference(), &wizard_id)
        .await?;
    if owner != wizard_id {
        warn!(
            "Payment {} already unlocked wizard {}; refusing wizard {}",
            request.reference(),
            owner,
            wizard_id
        );
        return Err(AppError::PaymentAlreadyUsed(request.reference().to_string()));
    }
    state.store.save(&wizard_id, &next).await?;

    info!("Wizard {} unlocked via {}", wizard_id, request.reference());
    Ok(Json(next.snapshot(&wizard_id)))
}

/// DELETE /api/wizard/:wizard_id
///
/// Start over: the record is dropped and the client returns to input with a
/// locked wizard. Resetting an unknown wizard is not an error.
pub async fn handle_reset_wizard(
    State(state): State<AppState>,
    Path(wizard_id): Path<String>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = state.store.load(&wizard_id).await?.unwrap_or_default();
    let cleared = wizard.apply(WizardEvent::Reset)?;
    state.store.delete(&wizard_id).await?;

    info!("Wizard {} reset from {} step", wizard_id, wizard.step);
    Ok(Json(cleared.snapshot(&wizard_id)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::to_bytes,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::generator::testing::ScriptedGenerator;
    use crate::analysis::reconciler::SectionSlots;
    use crate::payment::verifier::testing::{paid, unpaid, ScriptedVerifier};
    use crate::routes::build_router;
    use crate::state::testing::test_state;
    use crate::wizard::machine::WizardStep;
    use crate::wizard::store::{InMemoryStateStore, StateStore};

    fn chunks() -> Vec<&'static str> {
        vec![
            "### Overall Summary\nYour resume shows strong backend depth but lacks ",
            "quantified impact in every role.\n### Section-by-Section Breakdown\n- Add metrics\n",
            "### Refined Resume Copy\n```\nJane Roe\n```\n### Cover Letter Draft\nDear team,",
        ]
    }

    fn app_with(verifier: ScriptedVerifier) -> (axum::Router, Arc<InMemoryStateStore>) {
        let (state, store) = test_state(
            Arc::new(ScriptedGenerator::chunks(chunks())),
            Arc::new(verifier),
        );
        (build_router(state), store)
    }

    async fn seed(store: &InMemoryStateStore, step: WizardStep) {
        let wizard = WizardState {
            step,
            sections: SectionSlots {
                summary: "Solid.".to_string(),
                details: "- Add metrics".to_string(),
                refined_copy: "Jane Roe".to_string(),
                cover_letter: "Dear team,".to_string(),
            },
            ..WizardState::default()
        };
        store.save("w1", &wizard).await.unwrap();
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_start_streams_ndjson_and_persists() {
        let (app, store) = app_with(ScriptedVerifier::default());
        let response = app
            .oneshot(post(
                "/api/wizard",
                json!({"wizardId": "w1", "resume": "Jane Roe", "goals": "Staff role"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[WIZARD_ID_HEADER], "w1");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-ndjson"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let events: Vec<Value> = String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(events.first().unwrap()["type"], "section");
        assert_eq!(
            events.iter().filter(|e| e["type"] == "summary_ready").count(),
            1
        );
        let last = events.last().unwrap();
        assert_eq!(last["type"], "complete");
        assert_eq!(last["wizardId"], "w1");
        assert_eq!(last["state"]["step"], "summary");
        assert!(last["state"]["sections"].get("coverLetter").is_none());

        let saved = store.load("w1").await.unwrap().unwrap();
        assert_eq!(saved.sections.cover_letter, "Dear team,");
        assert!(!saved.is_unlocked);
    }

    #[tokio::test]
    async fn test_start_rejects_missing_goals() {
        let (app, _) = app_with(ScriptedVerifier::default());
        let response = app
            .oneshot(post("/api/wizard", json!({"resume": "Jane Roe", "goals": " "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], INPUTS_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_start_rejects_absent_resume_field() {
        let (app, store) = app_with(ScriptedVerifier::default());
        let response = app
            .oneshot(post(
                "/api/wizard",
                json!({"wizardId": "w1", "goals": "Staff role"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], INPUTS_REQUIRED_MESSAGE);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(store.load("w1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_rejects_malformed_wizard_id() {
        let (app, _) = app_with(ScriptedVerifier::default());
        let response = app
            .oneshot(post(
                "/api/wizard",
                json!({"wizardId": "a:b", "resume": "r", "goals": "g"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_wizard_is_not_found() {
        let (app, _) = app_with(ScriptedVerifier::default());
        let response = app
            .oneshot(Request::get("/api/wizard/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_locked_navigation_is_forbidden_and_state_kept() {
        let (app, store) = app_with(ScriptedVerifier::default());
        seed(&store, WizardStep::Details).await;

        let response = app
            .oneshot(post("/api/wizard/w1/navigate", json!({"direction": "next"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "LOCKED");
        assert_eq!(
            store.load("w1").await.unwrap().unwrap().step,
            WizardStep::Details
        );
    }

    #[tokio::test]
    async fn test_navigate_next_from_summary() {
        let (app, store) = app_with(ScriptedVerifier::default());
        seed(&store, WizardStep::Summary).await;

        let response = app
            .oneshot(post("/api/wizard/w1/navigate", json!({"direction": "next"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["step"], "details");
        assert_eq!(body["view"]["kind"], "unlockPrompt");
    }

    #[tokio::test]
    async fn test_unlock_then_walk_forward() {
        let (app, store) = app_with(ScriptedVerifier::returning(vec![Ok(paid())]));
        seed(&store, WizardStep::Summary).await;

        let response = app
            .clone()
            .oneshot(post("/api/wizard/w1/unlock", json!({"sessionId": "cs_test_1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["isUnlocked"], true);
        assert_eq!(body["step"], "details");
        assert_eq!(body["sections"]["refinedCopy"], "Jane Roe");

        let saved = store.load("w1").await.unwrap().unwrap();
        assert_eq!(saved.payment.unwrap().session_id, "cs_test_1");

        let response = app
            .oneshot(post("/api/wizard/w1/navigate", json!({"direction": "next"})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["step"], "refined");
    }

    #[tokio::test]
    async fn test_unpaid_session_is_payment_required() {
        let (app, store) = app_with(ScriptedVerifier::returning(vec![Ok(unpaid())]));
        seed(&store, WizardStep::Details).await;

        let response = app
            .oneshot(post("/api/wizard/w1/unlock", json!({"sessionId": "cs_open"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert!(!store.load("w1").await.unwrap().unwrap().is_unlocked);
    }

    #[tokio::test]
    async fn test_unlock_without_verifier_is_unavailable() {
        let (app, store) = app_with(ScriptedVerifier::default());
        seed(&store, WizardStep::Details).await;

        let response = app
            .oneshot(post("/api/wizard/w1/unlock", json!({"sessionId": "cs_1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_payment_cannot_unlock_a_second_wizard() {
        let (app, store) = app_with(ScriptedVerifier::returning(vec![Ok(paid()), Ok(paid())]));
        seed(&store, WizardStep::Summary).await;
        let other = store.load("w1").await.unwrap().unwrap();
        store.save("w2", &other).await.unwrap();

        let response = app
            .clone()
            .oneshot(post("/api/wizard/w1/unlock", json!({"sessionId": "cs_test_1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post("/api/wizard/w2/unlock", json!({"sessionId": "cs_test_1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "PAYMENT_ALREADY_USED");
        assert!(!store.load("w2").await.unwrap().unwrap().is_unlocked);
    }

    #[tokio::test]
    async fn test_reset_relocks_and_deletes_record() {
        let (app, store) = app_with(ScriptedVerifier::returning(vec![Ok(paid())]));
        seed(&store, WizardStep::Summary).await;

        let response = app
            .clone()
            .oneshot(post("/api/wizard/w1/unlock", json!({"sessionId": "cs_test_1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::delete("/api/wizard/w1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["step"], "input");
        assert_eq!(body["isUnlocked"], false);
        assert_eq!(body["view"]["kind"], "input");
        assert!(body["sections"].get("refinedCopy").is_none());
        assert!(store.load("w1").await.unwrap().is_none());

        let response = app
            .oneshot(Request::get("/api/wizard/w1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reset_unknown_wizard_is_not_an_error() {
        let (app, _) = app_with(ScriptedVerifier::default());
        let response = app
            .oneshot(
                Request::delete("/api/wizard/never-started")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["step"], "input");
    }
}
