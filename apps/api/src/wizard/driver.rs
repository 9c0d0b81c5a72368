//! Generation driver: runs one feedback stream through the reconciler and
//! reports progress as a sequence of events.
//!
//! The stream owns its reconciler; nothing else touches it while chunks arrive.
//! Gated sections are announced as locked rather than sent, so a locked client
//! never receives paid content.

use std::collections::HashSet;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::analysis::generator::FeedbackGenerator;
use crate::analysis::reconciler::{SectionSlots, StreamReconciler};
use crate::errors::STORAGE_FAILED_MESSAGE;
use crate::extraction::Section;
use crate::models::resume::ResumeInputs;
use crate::wizard::machine::{WizardEvent, WizardSnapshot, WizardState};
use crate::wizard::store::StateStore;

pub const STREAM_FAILED_MESSAGE: &str =
    "Failed to get recommendations. Please check your connection and try again.";
pub const NO_CONTENT_MESSAGE: &str = "No content was generated. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Section {
        section: Section,
        content: String,
    },
    Locked {
        section: Section,
    },
    SummaryReady,
    Complete {
        #[serde(rename = "wizardId")]
        wizard_id: String,
        state: Box<WizardSnapshot>,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    fn error(message: &str) -> Self {
        ProgressEvent::Error {
            message: message.to_string(),
        }
    }
}

/// Tracks which sections have been announced to the client.
#[derive(Default)]
struct Publisher {
    locked_announced: HashSet<Section>,
}

impl Publisher {
    fn events(&mut self, changed: &[Section], slots: &SectionSlots) -> Vec<ProgressEvent> {
        changed
            .iter()
            .filter_map(|&section| {
                if !section.is_gated() {
                    Some(ProgressEvent::Section {
                        section,
                        content: slots.get(section).to_string(),
                    })
                } else if self.locked_announced.insert(section) {
                    Some(ProgressEvent::Locked { section })
                } else {
                    None
                }
            })
            .collect()
    }
}

fn summary_ready(state: &mut WizardState) -> bool {
    match state.apply(WizardEvent::SummaryReady) {
        Ok(next) => {
            *state = next;
            true
        }
        Err(e) => {
            warn!("Ignoring summary-ready signal: {}", e);
            false
        }
    }
}

/// Generates feedback for `inputs`, persisting the result under `wizard_id`.
///
/// Emits section/locked events as content arrives, a single `summary_ready`,
/// then exactly one terminal `complete` or `error`. Nothing is persisted when
/// the stream fails. A stream that ends without a summary still persists what
/// it extracted, locked and on the input step, before reporting no content.
pub fn run_generation(
    generator: Arc<dyn FeedbackGenerator>,
    store: Arc<dyn StateStore>,
    wizard_id: String,
    inputs: ResumeInputs,
) -> impl Stream<Item = ProgressEvent> + Send {
    async_stream::stream! {
        let mut state = WizardState::for_inputs(inputs.clone());
        let mut publisher = Publisher::default();
        let mut reconciler = StreamReconciler::new();

        let mut chunks = match generator.generate_stream(&inputs).await {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Wizard {}: generation failed to start: {}", wizard_id, e);
                yield ProgressEvent::error(STREAM_FAILED_MESSAGE);
                return;
            }
        };

        while let Some(chunk) = chunks.next().await {
            let text = match chunk {
                Ok(text) => text,
                Err(e) => {
                    error!(
                        "Wizard {}: stream broke after {} chars: {}",
                        wizard_id,
                        reconciler.buffer().len(),
                        e
                    );
                    yield ProgressEvent::error(STREAM_FAILED_MESSAGE);
                    return;
                }
            };

            let update = reconciler.push(&text);
            for event in publisher.events(&update.changed, reconciler.slots()) {
                yield event;
            }
            if update.summary_ready && summary_ready(&mut state) {
                yield ProgressEvent::SummaryReady;
            }
        }

        let published = reconciler.slots().clone();
        let sections = reconciler.finish();
        if !sections.has_content() {
            warn!(
                "Wizard {}: no summary in {} chars of output",
                wizard_id, sections.document_len
            );
            let display = sections.extracted.with_placeholders();
            for event in publisher.events(&Section::ALL, &display) {
                yield event;
            }
            state.sections = sections.extracted;
            if let Err(e) = store.save(&wizard_id, &state).await {
                error!("Wizard {}: failed to persist state: {}", wizard_id, e);
                yield ProgressEvent::error(STORAGE_FAILED_MESSAGE);
                return;
            }
            yield ProgressEvent::error(NO_CONTENT_MESSAGE);
            return;
        }

        let late: Vec<Section> = Section::ALL
            .into_iter()
            .filter(|&s| sections.extracted.get(s) != published.get(s))
            .collect();
        for event in publisher.events(&late, &sections.extracted) {
            yield event;
        }
        if !sections.summary_signalled && summary_ready(&mut state) {
            yield ProgressEvent::SummaryReady;
        }

        state.sections = sections.extracted;
        if let Err(e) = store.save(&wizard_id, &state).await {
            error!("Wizard {}: failed to persist state: {}", wizard_id, e);
            yield ProgressEvent::error(STORAGE_FAILED_MESSAGE);
            return;
        }

        info!(
            "Wizard {}: generation complete ({} chars)",
            wizard_id, sections.document_len
        );
        yield ProgressEvent::Complete {
            state: Box::new(state.snapshot(&wizard_id)),
            wizard_id,
        };
    }
}
