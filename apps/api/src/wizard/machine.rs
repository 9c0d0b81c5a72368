//! Wizard State Machine: a pure reducer over `WizardState`.
//!
//! Step order: input → summary → details → refined → coverLetter.
//! `refined` and `coverLetter` can only be entered once the analysis is
//! unlocked; `details` shows an unlock prompt until then.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::reconciler::SectionSlots;
use crate::extraction::Section;
use crate::models::resume::ResumeInputs;
use crate::payment::PaymentVerification;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    #[default]
    Input,
    Summary,
    Details,
    Refined,
    CoverLetter,
}

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Input => "input",
            WizardStep::Summary => "summary",
            WizardStep::Details => "details",
            WizardStep::Refined => "refined",
            WizardStep::CoverLetter => "coverLetter",
        }
    }

    /// Steps that cannot be entered while locked.
    pub fn requires_unlock(self) -> bool {
        matches!(self, WizardStep::Refined | WizardStep::CoverLetter)
    }

    /// The section shown on this step, if any.
    pub fn section(self) -> Option<Section> {
        match self {
            WizardStep::Input => None,
            WizardStep::Summary => Some(Section::Summary),
            WizardStep::Details => Some(Section::Breakdown),
            WizardStep::Refined => Some(Section::RefinedCopy),
            WizardStep::CoverLetter => Some(Section::CoverLetter),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Back,
}

/// Recorded once a payment verification succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub paid_at: DateTime<Utc>,
    pub session_id: String,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    pub step: WizardStep,
    /// Only ever set by a successful payment verification; cleared by reset.
    pub is_unlocked: bool,
    /// Extracted section text. Never holds placeholder text.
    pub sections: SectionSlots,
    pub inputs: ResumeInputs,
    pub payment: Option<PaymentRecord>,
}

#[derive(Debug, Clone)]
pub enum WizardEvent {
    SummaryReady,
    Navigate(Direction),
    PaymentConfirmed {
        verification: PaymentVerification,
        reference: String,
        at: DateTime<Utc>,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("The {step} step is locked until the full analysis is unlocked")]
    Locked { step: WizardStep },

    #[error("Payment not completed (status: {payment_status})")]
    PaymentNotCompleted { payment_status: String },

    #[error("Cannot {action} from the {from} step")]
    InvalidTransition {
        from: WizardStep,
        action: &'static str,
    },
}

/// What the client should render for the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StepView {
    Input,
    Section { section: Section, content: String },
    UnlockPrompt { step: WizardStep },
}

/// Sections visible to the client. Gated sections are omitted while locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleSections {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_copy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub wizard_id: String,
    pub step: WizardStep,
    pub is_unlocked: bool,
    pub sections: VisibleSections,
    pub view: StepView,
    pub inputs: ResumeInputs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
}

impl WizardState {
    /// Fresh state for a new generation over `inputs`.
    pub fn for_inputs(inputs: ResumeInputs) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    /// Applies `event`, returning the next state. On error `self` is the
    /// state to keep.
    pub fn apply(&self, event: WizardEvent) -> Result<WizardState, WizardError> {
        match event {
            WizardEvent::SummaryReady => match self.step {
                WizardStep::Input => Ok(self.with_step(WizardStep::Summary)),
                from => Err(WizardError::InvalidTransition {
                    from,
                    action: "show the summary",
                }),
            },
            WizardEvent::Navigate(Direction::Next) => self.next(),
            WizardEvent::Navigate(Direction::Back) => self.back(),
            WizardEvent::PaymentConfirmed {
                verification,
                reference,
                at,
            } => {
                if !verification.success {
                    return Err(WizardError::PaymentNotCompleted {
                        payment_status: verification.payment_status,
                    });
                }
                Ok(WizardState {
                    step: WizardStep::Details,
                    is_unlocked: true,
                    payment: Some(PaymentRecord {
                        paid_at: at,
                        session_id: reference,
                        customer_email: verification.customer_email,
                    }),
                    ..self.clone()
                })
            }
            WizardEvent::Reset => Ok(WizardState::default()),
        }
    }

    fn next(&self) -> Result<WizardState, WizardError> {
        let target = match self.step {
            WizardStep::Summary => WizardStep::Details,
            WizardStep::Details => WizardStep::Refined,
            WizardStep::Refined => WizardStep::CoverLetter,
            from @ (WizardStep::Input | WizardStep::CoverLetter) => {
                return Err(WizardError::InvalidTransition {
                    from,
                    action: "move forward",
                })
            }
        };
        if target.requires_unlock() && !self.is_unlocked {
            return Err(WizardError::Locked { step: target });
        }
        Ok(self.with_step(target))
    }

    fn back(&self) -> Result<WizardState, WizardError> {
        let target = match self.step {
            WizardStep::Details => WizardStep::Summary,
            WizardStep::Refined => WizardStep::Details,
            WizardStep::CoverLetter => WizardStep::Refined,
            from @ (WizardStep::Input | WizardStep::Summary) => {
                return Err(WizardError::InvalidTransition {
                    from,
                    action: "go back",
                })
            }
        };
        Ok(self.with_step(target))
    }

    fn with_step(&self, step: WizardStep) -> WizardState {
        WizardState {
            step,
            ..self.clone()
        }
    }

    pub fn view(&self) -> StepView {
        match self.step.section() {
            None => StepView::Input,
            Some(section) if section.is_gated() && !self.is_unlocked => {
                StepView::UnlockPrompt { step: self.step }
            }
            Some(section) => {
                let content = match self.sections.get(section) {
                    "" => section.placeholder(),
                    text => text,
                };
                StepView::Section {
                    section,
                    content: content.to_string(),
                }
            }
        }
    }

    pub fn visible_sections(&self) -> VisibleSections {
        let display = self.sections.with_placeholders();
        let gated = |text: String| self.is_unlocked.then_some(text);
        VisibleSections {
            summary: display.summary,
            details: gated(display.details),
            refined_copy: gated(display.refined_copy),
            cover_letter: gated(display.cover_letter),
        }
    }

    pub fn snapshot(&self, wizard_id: &str) -> WizardSnapshot {
        WizardSnapshot {
            wizard_id: wizard_id.to_string(),
            step: self.step,
            is_unlocked: self.is_unlocked,
            sections: self.visible_sections(),
            view: self.view(),
            inputs: self.inputs.clone(),
            payment: self.payment.clone(),
        }
    }
}
