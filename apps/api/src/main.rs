mod analysis;
mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod payment;
mod routes;
mod state;
mod subscribers;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::generator::GeminiFeedbackGenerator;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::payment::HttpPaymentVerifier;
use crate::routes::build_router;
use crate::state::AppState;
use crate::subscribers::repository::ensure_schema;
use crate::wizard::store::{InMemoryStateStore, RedisStateStore, StateStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Optimizer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (subscribers)
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize wizard state store
    let store: Arc<dyn StateStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Wizard state in Redis (ttl {}s)", config.state_ttl_secs);
            Arc::new(RedisStateStore::new(client, config.state_ttl_secs))
        }
        None => {
            warn!("REDIS_URL not set; wizard state is kept in memory and lost on restart");
            Arc::new(InMemoryStateStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("GEMINI_API_KEY not set; analysis requests will fail");
    }
    let generator = Arc::new(GeminiFeedbackGenerator::new(llm));

    // Initialize payment verifier
    let payments = Arc::new(HttpPaymentVerifier::new(config.payment_verify_url.clone())?);
    if config.payment_verify_url.is_none() {
        warn!("PAYMENT_VERIFY_URL not set; unlock requests will fail");
    }
    if config.uses_default_admin_key() {
        warn!("ADMIN_API_KEY is the default value");
    }
    if config.beta_mode {
        info!("Beta mode enabled");
    }

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        generator,
        store,
        payments,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
