// Feedback document segmentation.
// Pure functions only: heading lookup → section slicing → fence cleanup.
// Sections are keyed by exact heading strings shared with the generation prompt.

pub mod cleaning;
pub mod heading;
pub mod sections;

pub use sections::Section;
