//! Extraction and scrape triggers.
//!
//! Extraction itself (table parsing, OCR of image labels) happens in the
//! extraction service. The catalog issues the request, waits for the terminal
//! outcome and refetches the page's rates on success.

use tracing::info;

use super::inflight::Operation;
use super::query::ConversionListing;
use super::Catalog;
use crate::error::Result;
use crate::models::{ExtractRequest, ScrapeOutcome, ScrapeRequest};

/// Result of a successful extraction request.
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// Raw service response.
    pub response: serde_json::Value,
    /// The page's rates, refetched after extraction.
    pub refreshed: ConversionListing,
}

impl Catalog {
    /// Ask the service to derive conversion rates for a page.
    ///
    /// With `use_ocr` the service also reads image metadata and labels. The
    /// page snapshot is dropped as well, since extraction may change its
    /// tables.
    pub async fn request_extraction(&self, url: &str, use_ocr: bool) -> Result<ExtractionOutcome> {
        let request = ExtractRequest::new(url, use_ocr);
        request.validate()?;
        let _guard = self.inflight.begin(Operation::Extract, &request.url)?;

        let response = self.service.extract(&request).await?;
        info!("Extraction finished for {} (ocr={})", request.url, use_ocr);

        self.invalidate_page(&request.url);
        let refreshed = self.list_conversions(Some(&request.url)).await;

        Ok(ExtractionOutcome {
            response,
            refreshed,
        })
    }

    /// Ask the service to fetch and store pages starting at `request.url`.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome> {
        request.validate()?;
        let _guard = self.inflight.begin(Operation::Scrape, &request.url)?;

        let outcome = self.service.scrape(request).await?;
        info!("Scrape of {} saved {} page(s)", request.url, outcome.pages_saved);

        self.invalidate_page_list();
        Ok(outcome)
    }
}
