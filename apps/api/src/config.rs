use anyhow::{Context, Result};

const DEFAULT_ADMIN_API_KEY: &str = "change-me-in-production";
const DEFAULT_STATE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Without Redis, wizard state is kept in process memory.
    pub redis_url: Option<String>,
    /// Checked per request so the service can start without it.
    pub gemini_api_key: Option<String>,
    pub payment_verify_url: Option<String>,
    pub admin_api_key: String,
    pub beta_mode: bool,
    pub state_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            payment_verify_url: optional_env("PAYMENT_VERIFY_URL"),
            admin_api_key: optional_env("ADMIN_API_KEY")
                .unwrap_or_else(|| DEFAULT_ADMIN_API_KEY.to_string()),
            beta_mode: optional_env("BETA_MODE").is_some_and(|v| v == "true"),
            state_ttl_secs: match optional_env("STATE_TTL_SECS") {
                Some(v) => v
                    .parse::<u64>()
                    .context("STATE_TTL_SECS must be a number of seconds")?,
                None => DEFAULT_STATE_TTL_SECS,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn uses_default_admin_key(&self) -> bool {
        self.admin_api_key == DEFAULT_ADMIN_API_KEY
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/resume_optimizer_test".to_string(),
            redis_url: None,
            gemini_api_key: None,
            payment_verify_url: None,
            admin_api_key: "test-admin-key".to_string(),
            beta_mode: false,
            state_ttl_secs: DEFAULT_STATE_TTL_SECS,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
