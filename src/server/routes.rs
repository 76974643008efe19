//! Router configuration for the reference service.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the router exposing the extraction service API.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/pages", get(handlers::api_pages))
        .route("/api/page", get(handlers::api_page))
        .route("/api/conversions", get(handlers::api_conversions))
        .route("/api/conversions/upsert", post(handlers::api_upsert))
        .route("/api/scrape", post(handlers::api_scrape))
        .route("/api/extract", post(handlers::api_extract))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
