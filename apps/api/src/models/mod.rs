pub mod resume;
pub mod subscriber;
