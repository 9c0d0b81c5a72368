// Subscribers: landing-page email capture and the admin export.

pub mod handlers;
pub mod repository;
