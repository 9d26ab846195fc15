// Application layer - Use cases and ports
pub mod credentials;
pub mod document_store;
pub mod map_refresh_service;
pub mod scheduler;
pub mod telemetry_repository;
