pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::payment::handlers as payment;
use crate::state::AppState;
use crate::subscribers::handlers as subscribers;
use crate::wizard::handlers as wizard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // One-shot analysis
        .route("/api/analyze", post(analysis::handle_analyze))
        .route("/api/analyze/stream", post(analysis::handle_analyze_stream))
        // Wizard
        .route("/api/wizard", post(wizard::handle_start_wizard))
        .route(
            "/api/wizard/:wizard_id",
            get(wizard::handle_get_wizard).delete(wizard::handle_reset_wizard),
        )
        .route(
            "/api/wizard/:wizard_id/navigate",
            post(wizard::handle_navigate),
        )
        .route("/api/wizard/:wizard_id/unlock", post(wizard::handle_unlock))
        // Payments
        .route("/api/beta-status", get(payment::handle_beta_status))
        // Subscribers
        .route("/api/subscribe", post(subscribers::handle_subscribe))
        .route("/api/admin/emails", get(subscribers::handle_admin_emails))
        .with_state(state)
}
