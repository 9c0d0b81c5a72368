//! Feedback generation: pluggable, trait-based source of the feedback document.
//!
//! Default: `GeminiFeedbackGenerator` (prompt + `LlmClient`).
//! `AppState` holds an `Arc<dyn FeedbackGenerator>` so handlers and the wizard
//! driver can be exercised against scripted output.

use async_trait::async_trait;
use tracing::info;

use crate::analysis::prompts::build_feedback_prompt;
use crate::llm_client::{LlmClient, LlmError, TextStream};
use crate::models::resume::ResumeInputs;

#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Produces the whole feedback document in one response.
    async fn generate(&self, inputs: &ResumeInputs) -> Result<String, LlmError>;

    /// Produces the feedback document as a stream of text chunks.
    async fn generate_stream(&self, inputs: &ResumeInputs) -> Result<TextStream, LlmError>;
}

pub struct GeminiFeedbackGenerator {
    llm: LlmClient,
}

impl GeminiFeedbackGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FeedbackGenerator for GeminiFeedbackGenerator {
    async fn generate(&self, inputs: &ResumeInputs) -> Result<String, LlmError> {
        let prompt = build_feedback_prompt(inputs);
        info!(
            "Generating feedback (tailored={}, prompt_chars={})",
            inputs.has_requirements(),
            prompt.len()
        );
        self.llm.call_text(&prompt).await
    }

    async fn generate_stream(&self, inputs: &ResumeInputs) -> Result<TextStream, LlmError> {
        let prompt = build_feedback_prompt(inputs);
        info!(
            "Streaming feedback (tailored={}, prompt_chars={})",
            inputs.has_requirements(),
            prompt.len()
        );
        self.llm.stream(&prompt).await
    }
}
