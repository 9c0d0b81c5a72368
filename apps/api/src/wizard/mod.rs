// Wizard: server-side state for the multi-step resume review, keyed by a
// client-held wizard id.

pub mod driver;
pub mod handlers;
pub mod machine;
pub mod store;

pub use machine::{WizardError, WizardStep};
