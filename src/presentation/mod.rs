// Presentation layer - HTTP surface
pub mod app_state;
pub mod handlers;
pub mod pages;
pub mod router;
