//! Manual conversion submissions and corrections.
//!
//! A submission for a (source, target) pair that already exists on the page
//! is a correction: the service replaces the rate and drops the provenance
//! text. The catalog never patches its own snapshot; it invalidates and
//! refetches the page instead.

use tracing::info;

use super::inflight::Operation;
use super::query::ConversionListing;
use super::Catalog;
use crate::error::{Result, ValidationError};
use crate::models::{parse_rate, ConversionItem, ConversionRecord, UpsertRequest};

/// Raw operator input for a single conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionForm {
    pub page_url: String,
    pub page_title: String,
    pub source: String,
    pub target: String,
    pub rate: String,
}

impl ConversionForm {
    /// Validate the form and build the request it describes.
    pub fn into_request(self) -> std::result::Result<UpsertRequest, ValidationError> {
        let rate = parse_rate(&self.rate)?;
        let request = UpsertRequest::single(
            &self.page_url,
            Some(&self.page_title),
            ConversionItem::new(&self.source, &self.target, rate),
        );
        request.validate()?;
        Ok(request)
    }
}

/// Result of a successful upsert.
#[derive(Debug)]
pub struct UpsertOutcome {
    /// Records the service reported as written (may be empty).
    pub saved: Vec<ConversionRecord>,
    /// The page's catalog, refetched after the write.
    pub refreshed: ConversionListing,
}

impl Catalog {
    /// Create or correct conversions for a page.
    ///
    /// Invalid requests are rejected locally and never sent.
    pub async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertOutcome> {
        request.validate()?;
        let _guard = self.inflight.begin(Operation::Upsert, &request.page_url)?;

        let saved = self.service.upsert_conversions(request).await?;
        info!(
            "Upserted {} conversion(s) for {}",
            request.items.len(),
            request.page_url
        );

        self.invalidate_page(&request.page_url);
        let refreshed = self.list_conversions(Some(&request.page_url)).await;

        Ok(UpsertOutcome { saved, refreshed })
    }

    /// Validate raw form input, then upsert it.
    pub async fn submit(&self, form: ConversionForm) -> Result<UpsertOutcome> {
        let request = form.into_request()?;
        self.upsert(&request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::ScriptedService;
    use super::*;
    use crate::error::CatalogError;

    fn form(page_url: &str, source: &str, target: &str, rate: &str) -> ConversionForm {
        ConversionForm {
            page_url: page_url.to_string(),
            page_title: String::new(),
            source: source.to_string(),
            target: target.to_string(),
            rate: rate.to_string(),
        }
    }

    #[tokio::test]
    async fn test_invalid_input_sends_nothing() {
        let service = Arc::new(ScriptedService::default());
        let catalog = Catalog::from_arc(service.clone());
        let page = "https://example.com/gems";

        let bad = [
            form(page, "Gem", "Coin", "0"),
            form(page, "Gem", "Coin", "-3"),
            form(page, "Gem", "Coin", "lots"),
            form(page, "", "Coin", "120"),
            form(page, "Gem", "", "120"),
            form("", "Gem", "Coin", "120"),
        ];
        for input in bad {
            let err = catalog.submit(input).await.unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)), "{err:?}");
        }
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_success_refetches_and_invalidates() {
        let service = Arc::new(ScriptedService::default());
        let catalog = Catalog::from_arc(service.clone());
        let mut rx = catalog.subscribe();

        let outcome = catalog
            .submit(form("https://example.com/gems", "Gem", "Coin", "120"))
            .await
            .unwrap();

        // One upsert plus one refetch.
        assert_eq!(service.calls(), 2);
        assert!(!outcome.refreshed.is_failed());
        assert!(rx.has_changed().unwrap());
        let inv = rx.borrow_and_update().clone();
        assert_eq!(inv.generation, 1);
        assert!(inv.affects("https://example.com/gems#top"));
        assert!(!inv.affects("https://example.com/coins"));
    }

    #[tokio::test]
    async fn test_service_detail_surfaces_verbatim() {
        let service = Arc::new(ScriptedService::default());
        service.fail("Page not stored yet");
        let catalog = Catalog::from_arc(service.clone());
        let rx = catalog.subscribe();

        let err = catalog
            .submit(form("https://example.com/gems", "Gem", "Coin", "120"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Page not stored yet");
        assert_eq!(service.calls(), 1);
        assert!(!rx.has_changed().unwrap());
        assert!(!catalog.is_in_flight(Operation::Upsert, "https://example.com/gems"));
    }

    #[tokio::test]
    async fn test_concurrent_upsert_same_page_refused() {
        let service = Arc::new(ScriptedService::default());
        let catalog = Catalog::from_arc(service.clone());
        let page = "https://example.com/gems";

        let _busy = catalog.inflight.begin(Operation::Upsert, page).unwrap();
        let err = catalog
            .submit(form(page, "Gem", "Coin", "120"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InFlight { .. }));
        assert_eq!(service.calls(), 0);
    }
}
