use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::generator::FeedbackGenerator;
use crate::config::Config;
use crate::payment::PaymentVerifier;
use crate::wizard::store::StateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable feedback source. Default: GeminiFeedbackGenerator.
    pub generator: Arc<dyn FeedbackGenerator>,
    /// Wizard state persistence. Redis when configured, in-memory otherwise.
    pub store: Arc<dyn StateStore>,
    pub payments: Arc<dyn PaymentVerifier>,
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::wizard::store::InMemoryStateStore;
    use sqlx::postgres::PgPoolOptions;

    /// State over fakes. The pool is lazy and never connects unless a
    /// subscriber route is exercised.
    pub(crate) fn test_state(
        generator: Arc<dyn FeedbackGenerator>,
        payments: Arc<dyn PaymentVerifier>,
    ) -> (AppState, Arc<InMemoryStateStore>) {
        let config = Config::for_tests();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        let store = Arc::new(InMemoryStateStore::new());
        let state = AppState {
            db,
            config,
            generator,
            store: store.clone(),
            payments,
        };
        (state, store)
    }
}
