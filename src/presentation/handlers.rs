// HTTP request handlers
use crate::presentation::app_state::AppState;
use crate::presentation::pages::{ERROR_PAGE, INDEX_PAGE, LOGIN_PAGE};
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Check the posted credentials and send the user on to the landing page
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    if state.credentials.verify(&form.username, &form.password) {
        Redirect::to("/index").into_response()
    } else {
        tracing::info!(username = %form.username, "rejected login");
        (StatusCode::UNAUTHORIZED, Html(ERROR_PAGE)).into_response()
    }
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Serve the latest map exactly as it was published
pub async fn current_map(State(state): State<Arc<AppState>>) -> Response {
    match state.documents.current().await {
        Ok(Some(document)) => Html(document.into_html()).into_response(),
        Ok(None) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Map not generated yet, try again shortly.",
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "failed to read map document");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
