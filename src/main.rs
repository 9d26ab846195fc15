// Main entry point - Dependency injection, refresh loop and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::document_store::MapDocumentStore;
use crate::application::map_refresh_service::{MapRefreshService, RefreshSettings};
use crate::application::scheduler::RefreshScheduler;
use crate::infrastructure::config::{DEFAULT_CONFIG_FILE, StorageBackend, load_app_config};
use crate::infrastructure::export_repository::ExportRepository;
use crate::infrastructure::html_map::HtmlMapRenderer;
use crate::infrastructure::map_store::{FileMapStore, MemoryMapStore};
use crate::infrastructure::static_credentials::StaticCredentials;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config_path = std::env::var("BLEMAP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = load_app_config(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;
    let offset = config.polling.offset()?;

    // Create adapters (infrastructure layer)
    let repository = Arc::new(ExportRepository::new(&config.source)?);
    let store: Arc<dyn MapDocumentStore> = match config.storage.backend {
        StorageBackend::File => {
            let file_store = FileMapStore::new(config.storage.map_path.clone());
            tracing::info!(path = %file_store.path().display(), "map document kept on disk");
            Arc::new(file_store)
        }
        StorageBackend::Memory => Arc::new(MemoryMapStore::new()),
    };
    let credentials = StaticCredentials::new(&config.users);
    if credentials.is_empty() {
        tracing::warn!("no users configured, every login will be rejected");
    }

    // Create services (application layer)
    let refresh_service = MapRefreshService::new(
        repository,
        store.clone(),
        HtmlMapRenderer::new(config.map.clone()),
        RefreshSettings {
            device_ids: config.source.device_ids.clone(),
            window: config.polling.window(),
            scale_max: config.map.scale_max,
            fetch_concurrency: config.source.fetch_concurrency,
        },
    );
    let scheduler = RefreshScheduler::new(Arc::new(refresh_service), config.polling.interval(), offset);
    tokio::spawn(scheduler.run());

    // Create application state
    let state = Arc::new(AppState {
        credentials: Arc::new(credentials),
        documents: store,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        %addr,
        devices = config.source.device_ids.len(),
        source = %config.source.address,
        "starting blemap"
    );

    axum::serve(listener, router).await?;

    Ok(())
}
