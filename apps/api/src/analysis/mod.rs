// Feedback analysis: prompt assembly, the pluggable generator, and the
// streaming reconciler that slices the document while it grows.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod reconciler;
