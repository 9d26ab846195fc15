// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod export_repository;
pub mod html_map;
pub mod map_store;
pub mod static_credentials;
pub mod tile_layout;
