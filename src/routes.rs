//! Health endpoints.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

/// Banner for `GET /`.
pub fn banner(catalog_title: &str) -> String {
    format!("{catalog_title} brief bot is running.")
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Build the health routes. `GET /` answers with a plain-text banner naming
/// the loaded catalog.
pub fn health_routes(catalog_title: &str) -> Router {
    let banner = banner(catalog_title);
    Router::new()
        .route("/health", get(health))
        .route("/", get(move || async move { banner }))
}
