// Router wiring
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{current_map, health_check, index, login, login_page};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(login_page))
        .route("/login", post(login))
        .route("/index", get(index))
        .route("/map", get(current_map))
        .route("/healthz", get(health_check))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
