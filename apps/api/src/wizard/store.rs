//! Wizard state persistence.
//!
//! Records are JSON under `resumeOptimizerState:<wizard id>`. A record that no
//! longer parses is deleted and reported as absent; a record written by a newer
//! schema version is refused rather than guessed at.
//!
//! Verified payment references are claimed under
//! `resumeOptimizerPayment:<reference>` so one payment unlocks one wizard.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::analysis::reconciler::SectionSlots;
use crate::models::resume::ResumeInputs;
use crate::wizard::machine::{PaymentRecord, WizardState, WizardStep};

pub const STATE_KEY_PREFIX: &str = "resumeOptimizerState";
pub const PAYMENT_KEY_PREFIX: &str = "resumeOptimizerPayment";
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported state version {0}")]
    UnsupportedVersion(u32),
}

fn current_version() -> u32 {
    STATE_VERSION
}

/// The stored record. Field names match what clients already hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub refined_copy: String,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub step: WizardStep,
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub is_unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

impl From<&WizardState> for PersistedState {
    fn from(state: &WizardState) -> Self {
        let payment = state.payment.as_ref();
        PersistedState {
            version: STATE_VERSION,
            summary: state.sections.summary.clone(),
            details: state.sections.details.clone(),
            refined_copy: state.sections.refined_copy.clone(),
            cover_letter: state.sections.cover_letter.clone(),
            step: state.step,
            resume: state.inputs.resume.clone(),
            goals: state.inputs.goals.clone(),
            requirements: state.inputs.requirements.clone(),
            is_unlocked: state.is_unlocked,
            payment_timestamp: payment.map(|p| p.paid_at),
            session_id: payment.map(|p| p.session_id.clone()),
            customer_email: payment.and_then(|p| p.customer_email.clone()),
        }
    }
}

impl PersistedState {
    pub fn into_state(self) -> Result<WizardState, StoreError> {
        if self.version > STATE_VERSION {
            return Err(StoreError::UnsupportedVersion(self.version));
        }

        let payment = match (self.payment_timestamp, self.session_id) {
            (Some(paid_at), Some(session_id)) => Some(PaymentRecord {
                paid_at,
                session_id,
                customer_email: self.customer_email,
            }),
            _ => None,
        };

        Ok(WizardState {
            step: self.step,
            is_unlocked: self.is_unlocked,
            sections: SectionSlots {
                summary: self.summary,
                details: self.details,
                refined_copy: self.refined_copy,
                cover_letter: self.cover_letter,
            },
            inputs: ResumeInputs {
                resume: self.resume,
                goals: self.goals,
                requirements: self.requirements,
            },
            payment,
        })
    }
}

pub fn state_key(wizard_id: &str) -> String {
    format!("{STATE_KEY_PREFIX}:{wizard_id}")
}

pub fn payment_key(reference: &str) -> String {
    format!("{PAYMENT_KEY_PREFIX}:{reference}")
}

fn encode(state: &WizardState) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&PersistedState::from(state))?)
}

/// `Ok(None)` means the record is corrupt and should be discarded.
fn decode(wizard_id: &str, raw: &str) -> Result<Option<WizardState>, StoreError> {
    match serde_json::from_str::<PersistedState>(raw) {
        Ok(record) => record.into_state().map(Some),
        Err(e) => {
            warn!("Discarding unreadable wizard state {}: {}", wizard_id, e);
            Ok(None)
        }
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, wizard_id: &str) -> Result<Option<WizardState>, StoreError>;

    async fn save(&self, wizard_id: &str, state: &WizardState) -> Result<(), StoreError>;

    async fn delete(&self, wizard_id: &str) -> Result<(), StoreError>;

    /// Records `reference` as spent on `wizard_id` unless another wizard
    /// already holds it. Returns the wizard that owns the reference.
    async fn claim_payment(&self, reference: &str, wizard_id: &str) -> Result<String, StoreError>;
}

pub struct RedisStateStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisStateStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn load(&self, wizard_id: &str) -> Result<Option<WizardState>, StoreError> {
        let key = state_key(wizard_id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(&key).await?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let state = decode(wizard_id, &raw)?;
        if state.is_none() {
            let _: () = conn.del(&key).await?;
        }
        Ok(state)
    }

    async fn save(&self, wizard_id: &str, state: &WizardState) -> Result<(), StoreError> {
        let payload = encode(state)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(state_key(wizard_id), payload, self.ttl_secs)
            .await?;
        debug!("Saved wizard state {} (step={})", wizard_id, state.step);
        Ok(())
    }

    async fn delete(&self, wizard_id: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(state_key(wizard_id)).await?;
        Ok(())
    }

    async fn claim_payment(&self, reference: &str, wizard_id: &str) -> Result<String, StoreError> {
        let key = payment_key(reference);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let claimed: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(wizard_id)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await?;
        if claimed.is_some() {
            return Ok(wizard_id.to_string());
        }

        let owner: Option<String> = conn.get(&key).await?;
        // The claim can expire between SET and GET; the caller keeps it then.
        Ok(owner.unwrap_or_else(|| wizard_id.to_string()))
    }
}

/// Process-local store used when no Redis URL is configured, and in tests.
/// Records do not expire.
#[derive(Default)]
pub struct InMemoryStateStore {
    records: RwLock<HashMap<String, String>>,
    claims: RwLock<HashMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn put_raw(&self, wizard_id: &str, raw: &str) {
        self.records
            .write()
            .await
            .insert(state_key(wizard_id), raw.to_string());
    }

    #[cfg(test)]
    pub(crate) async fn contains(&self, wizard_id: &str) -> bool {
        self.records.read().await.contains_key(&state_key(wizard_id))
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, wizard_id: &str) -> Result<Option<WizardState>, StoreError> {
        let key = state_key(wizard_id);
        let raw = self.records.read().await.get(&key).cloned();

        let Some(raw) = raw else {
            return Ok(None);
        };
        let state = decode(wizard_id, &raw)?;
        if state.is_none() {
            self.records.write().await.remove(&key);
        }
        Ok(state)
    }

    async fn save(&self, wizard_id: &str, state: &WizardState) -> Result<(), StoreError> {
        let payload = encode(state)?;
        self.records
            .write()
            .await
            .insert(state_key(wizard_id), payload);
        Ok(())
    }

    async fn delete(&self, wizard_id: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(&state_key(wizard_id));
        Ok(())
    }

    async fn claim_payment(&self, reference: &str, wizard_id: &str) -> Result<String, StoreError> {
        let mut claims = self.claims.write().await;
        let owner = claims
            .entry(payment_key(reference))
            .or_insert_with(|| wizard_id.to_string());
        Ok(owner.clone())
    }
}
