//! JSON API handlers.
//!
//! Every failure is answered with `{"detail": "..."}` and a matching status.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::client::ExtractionService;
use crate::error::CatalogError;
use crate::models::{ExtractRequest, ScrapeRequest, UpsertRequest};

/// Wraps a catalog error into a `{detail}` response.
pub struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CatalogError::service(
            Some(rejection.status().as_u16()),
            rejection.body_text(),
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::InFlight { .. } => StatusCode::CONFLICT,
            CatalogError::Transport(_) => StatusCode::BAD_GATEWAY,
            CatalogError::Service { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };
        let body = serde_json::json!({ "detail": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

/// Query parameters for page lookup.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub url: Option<String>,
}

/// Query parameters for the conversion listing.
#[derive(Debug, Deserialize)]
pub struct ConversionParams {
    pub page_url: Option<String>,
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// `GET /api/pages`
pub async fn api_pages(State(state): State<AppState>) -> ApiResult {
    let items = state.backend.list_pages().await?;
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

/// `GET /api/page?url=`
pub async fn api_page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult {
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| CatalogError::service(Some(422), "url is required"))?;
    let detail = state.backend.get_page(&url).await?;
    Ok(Json(detail).into_response())
}

/// `GET /api/conversions?page_url=`
pub async fn api_conversions(
    State(state): State<AppState>,
    Query(params): Query<ConversionParams>,
) -> ApiResult {
    let items = state
        .backend
        .list_conversions(params.page_url.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

/// `POST /api/conversions/upsert`
pub async fn api_upsert(
    State(state): State<AppState>,
    body: Result<Json<UpsertRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    let items = state.backend.upsert_conversions(&request).await?;
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

/// `POST /api/scrape`
pub async fn api_scrape(
    State(state): State<AppState>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    let outcome = state.backend.scrape(&request).await?;
    Ok(Json(outcome).into_response())
}

/// `POST /api/extract`
pub async fn api_extract(
    State(state): State<AppState>,
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    let outcome = state.backend.extract(&request).await?;
    Ok(Json(outcome).into_response())
}
