//! Pages, their tables and their conversion rates.

use tracing::{debug, warn};

use super::inflight::Operation;
use super::query::ConversionListing;
use super::{normalize_filter, Catalog};
use crate::error::{CatalogError, Result, ValidationError};
use crate::models::{Page, PageDetail};

/// Everything shown for a selected page, loaded together.
#[derive(Debug)]
pub struct PageView {
    pub url: String,
    /// The page and its tables. A load failure does not hide the rates.
    pub page: Result<PageDetail>,
    pub rates: ConversionListing,
}

impl Catalog {
    /// List stored pages, keeping those whose title or path contains
    /// `filter` (case-insensitive).
    pub async fn list_pages(&self, filter: Option<&str>) -> Result<Vec<Page>> {
        let _loading = self.inflight.track(Operation::LoadPages, "");
        let pages = self.service.list_pages().await?;
        self.cache.set_page_list(pages.clone());

        Ok(match normalize_filter(filter) {
            Some(needle) => pages.into_iter().filter(|p| p.matches(needle)).collect(),
            None => pages,
        })
    }

    /// Fetch a page with its tables.
    ///
    /// The result replaces any earlier snapshot of the page; tables are never
    /// merged across fetches.
    pub async fn get_page(&self, url: &str) -> Result<PageDetail> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl.into());
        }
        let _loading = self.inflight.track(Operation::LoadPage, url);

        let detail = self.service.get_page(url).await?;
        if let Err((index, mismatch)) = detail.check_shape() {
            warn!("Page {} returned a malformed table: {}", url, mismatch);
            return Err(CatalogError::service(
                None,
                format!("Malformed response: table {}: {}", index + 1, mismatch),
            ));
        }

        debug!("Loaded page {} with {} table(s)", url, detail.tables.len());
        self.cache.set_page(url, detail.clone());
        Ok(detail)
    }

    /// Conversions owned by one page.
    pub async fn get_conversions_for(&self, url: &str) -> ConversionListing {
        self.list_conversions(Some(url)).await
    }

    /// Load a page and its rates concurrently.
    pub async fn open_page(&self, url: &str) -> PageView {
        let (page, rates) = tokio::join!(self.get_page(url), self.get_conversions_for(url));
        PageView {
            url: url.trim().to_string(),
            page,
            rates,
        }
    }
}
