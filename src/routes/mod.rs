//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the REST endpoints the chat client consumes, plus two
//! health probes. CORS is restricted to the configured browser origins.

pub mod conversations;

use axum::Router;
use axum::http::HeaderValue;
use axum::response::Json;
use axum::routing::{delete, get, post};
use serde_json::{Value, json};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Parse a comma-separated origin list, skipping blanks and invalid values.
pub(crate) fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

fn cors_layer() -> CorsLayer {
    let raw = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGINS.to_owned());
    CorsLayer::new()
        .allow_origin(parse_origins(&raw))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/conversations", post(conversations::create_conversation))
        .route("/api/conversations/{id}", delete(conversations::delete_conversation))
        .route("/api/conversations/{id}/messages", get(conversations::list_messages))
        .route("/api/chat", post(conversations::chat))
        .layer(cors_layer())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "AI Chatbot API is running!", "status": "healthy" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
