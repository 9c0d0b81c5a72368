use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::models::subscriber::SubscriberRow;

pub const DEFAULT_SOURCE: &str = "landing_page";

pub struct NewSubscriber<'a> {
    /// Already trimmed and lowercased.
    pub email: &'a str,
    pub source: &'a str,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created { id: i64 },
    AlreadySubscribed,
}

/// Creates the subscriber table and its indexes if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS email_subscribers (
            id          BIGSERIAL PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            source      TEXT NOT NULL DEFAULT 'landing_page',
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ip_address  TEXT,
            user_agent  TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_email_subscribers_created_at ON email_subscribers (created_at)",
    )
    .execute(pool)
    .await?;

    info!("Subscriber schema ready");
    Ok(())
}

/// Inserts a subscriber. An existing email is reported, not treated as an error.
pub async fn save_email(
    pool: &PgPool,
    subscriber: &NewSubscriber<'_>,
) -> Result<SaveOutcome, sqlx::Error> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO email_subscribers (email, source, ip_address, user_agent)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(subscriber.email)
    .bind(subscriber.source)
    .bind(subscriber.ip_address)
    .bind(subscriber.user_agent)
    .fetch_optional(pool)
    .await?;

    Ok(match id {
        Some(id) => SaveOutcome::Created { id },
        None => SaveOutcome::AlreadySubscribed,
    })
}

/// Newest first. `limit` of `None` returns every subscriber.
pub async fn list_subscribers(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<SubscriberRow>, sqlx::Error> {
    match limit {
        Some(limit) => {
            sqlx::query_as::<_, SubscriberRow>(
                "SELECT * FROM email_subscribers ORDER BY created_at DESC LIMIT $1",
            )
            .bind(limit.max(0))
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, SubscriberRow>(
                "SELECT * FROM email_subscribers ORDER BY created_at DESC",
            )
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn count_subscribers(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM email_subscribers")
        .fetch_one(pool)
        .await
}
