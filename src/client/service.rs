//! Pluggable boundary to the extraction service.
//!
//! Allows swapping between the HTTP service (production) and the in-memory
//! reference service (local runs and tests).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ConversionRecord, ExtractRequest, Page, PageDetail, ScrapeOutcome, ScrapeRequest,
    UpsertRequest,
};

/// Operations the extraction service exposes. Implementations perform no
/// client-side validation; that happens in [`crate::catalog::Catalog`].
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// `GET /api/pages`
    async fn list_pages(&self) -> Result<Vec<Page>>;

    /// `GET /api/page?url=<url>`
    async fn get_page(&self, url: &str) -> Result<PageDetail>;

    /// `GET /api/conversions[?page_url=<url>]`, in server order.
    async fn list_conversions(&self, page_url: Option<&str>) -> Result<Vec<ConversionRecord>>;

    /// `POST /api/conversions/upsert`. Returns whatever records the service
    /// reports as written (possibly none).
    async fn upsert_conversions(&self, request: &UpsertRequest) -> Result<Vec<ConversionRecord>>;

    /// `POST /api/scrape`
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome>;

    /// `POST /api/extract`. The outcome body is opaque to this crate.
    async fn extract(&self, request: &ExtractRequest) -> Result<serde_json::Value>;
}
