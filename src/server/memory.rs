//! In-memory extraction service.
//!
//! Holds pages, tables and conversion records in process. Extraction results
//! are staged per page rather than computed, since parsing and OCR live in the
//! real service.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::seed::SeedData;
use crate::client::ExtractionService;
use crate::error::{CatalogError, Result};
use crate::models::{
    canonical_page_url, ConversionRecord, ExtractRequest, Page, PageDetail, ScrapeOutcome,
    ScrapeRequest, Table, UpsertRequest,
};
use crate::store::{ConversionStore, ExtractedRate};

/// Rates an extraction of a page will produce.
#[derive(Debug, Clone, Default)]
struct StagedExtraction {
    text: Vec<ExtractedRate>,
    ocr: Vec<ExtractedRate>,
}

#[derive(Debug, Clone)]
struct StoredPage {
    id: i64,
    url: String,
    title: Option<String>,
    path: String,
    tables: Vec<Table>,
}

#[derive(Default)]
struct BackendState {
    pages: Vec<StoredPage>,
    store: ConversionStore,
    staged: HashMap<String, StagedExtraction>,
}

impl BackendState {
    fn find_page(&self, url: &str) -> Option<&StoredPage> {
        let canonical = canonical_page_url(url);
        self.pages
            .iter()
            .find(|p| p.url == url || canonical_page_url(&p.url) == canonical)
    }

    /// URL records for `url` are stored under: the stored page's own URL,
    /// or the canonical form when the page is not stored.
    fn page_key(&self, url: &str) -> String {
        self.find_page(url)
            .map(|p| p.url.clone())
            .unwrap_or_else(|| canonical_page_url(url))
    }

    fn project(&self, page: &StoredPage) -> Page {
        Page {
            id: Some(page.id),
            url: page.url.clone(),
            title: page.title.clone(),
            path: page.path.clone(),
            table_count: page.tables.len() as u32,
            conversion_count: Some(self.store.count_for(&page.url) as u32),
        }
    }
}

/// Extraction service backed by process memory.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<BackendState>,
}

fn not_found(url: &str) -> CatalogError {
    CatalogError::service(Some(404), format!("Page not found: {}", url))
}

/// Path component of a URL, or the input itself when it does not parse.
fn url_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend pre-populated from seed data.
    pub async fn from_seed(seed: SeedData) -> Self {
        let backend = Self::new();
        for page in seed.pages {
            backend.add_page(&page.url, page.title.as_deref(), page.tables).await;
        }
        {
            let mut state = backend.state.write().await;
            for conv in seed.conversions {
                match conv.page_url.as_deref() {
                    Some(url) => {
                        let url = state.page_key(url);
                        state.store.upsert(&url, conv.page_title.as_deref(), &[conv.item()]);
                    }
                    None => {
                        state.store.insert_global(&conv.source, &conv.target, conv.rate);
                    }
                }
            }
        }
        for staged in seed.extractions {
            backend
                .stage_extraction(&staged.page_url, staged.text, staged.ocr)
                .await;
        }
        backend
    }

    /// Store a page, replacing the tables of an existing page with the same URL.
    pub async fn add_page(&self, url: &str, title: Option<&str>, tables: Vec<Table>) {
        let mut state = self.state.write().await;
        let title = title.map(str::to_string);
        let canonical = canonical_page_url(url);
        if let Some(existing) = state
            .pages
            .iter_mut()
            .find(|p| canonical_page_url(&p.url) == canonical)
        {
            existing.title = title;
            existing.tables = tables;
            return;
        }
        let id = state.pages.len() as i64 + 1;
        state.pages.push(StoredPage {
            id,
            url: url.to_string(),
            title,
            path: url_path(url),
            tables,
        });
    }

    /// Set what the next extraction of `page_url` finds: `text` always,
    /// `ocr` additionally when OCR is requested.
    pub async fn stage_extraction(
        &self,
        page_url: &str,
        text: Vec<ExtractedRate>,
        ocr: Vec<ExtractedRate>,
    ) {
        let mut state = self.state.write().await;
        state
            .staged
            .insert(canonical_page_url(page_url), StagedExtraction { text, ocr });
    }

    /// Number of records across all pages.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.store.len()
    }
}

#[async_trait]
impl ExtractionService for MemoryBackend {
    async fn list_pages(&self) -> Result<Vec<Page>> {
        let state = self.state.read().await;
        Ok(state.pages.iter().map(|p| state.project(p)).collect())
    }

    async fn get_page(&self, url: &str) -> Result<PageDetail> {
        let state = self.state.read().await;
        let page = state.find_page(url).ok_or_else(|| not_found(url))?;
        Ok(PageDetail {
            page: state.project(page),
            tables: page.tables.clone(),
        })
    }

    async fn list_conversions(&self, page_url: Option<&str>) -> Result<Vec<ConversionRecord>> {
        let state = self.state.read().await;
        Ok(state.store.list(page_url.filter(|u| !u.is_empty())))
    }

    async fn upsert_conversions(&self, request: &UpsertRequest) -> Result<Vec<ConversionRecord>> {
        request
            .validate()
            .map_err(|e| CatalogError::service(Some(422), e.to_string()))?;
        let mut state = self.state.write().await;
        let page_url = state.page_key(&request.page_url);
        let saved = state
            .store
            .upsert(&page_url, request.page_title.as_deref(), &request.items);
        info!("Stored {} conversion(s) for {}", saved.len(), page_url);
        Ok(saved)
    }

    async fn scrape(&self, _request: &ScrapeRequest) -> Result<ScrapeOutcome> {
        Err(CatalogError::service(
            Some(501),
            "Scraping is not available on the in-memory service",
        ))
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<serde_json::Value> {
        let mut state = self.state.write().await;
        let (url, title) = {
            let page = state.find_page(&request.url).ok_or_else(|| not_found(&request.url))?;
            (page.url.clone(), page.title.clone())
        };

        let staged = state
            .staged
            .get(&canonical_page_url(&url))
            .cloned()
            .unwrap_or_default();
        let mut found = staged.text;
        if request.ocr {
            found.extend(staged.ocr);
        }

        let items = state.store.apply_extracted(&url, title.as_deref(), &found);
        info!("Extracted {} conversion(s) for {} (ocr={})", items.len(), url, request.ocr);
        Ok(serde_json::json!({
            "page_url": url,
            "found": items.len(),
            "items": items,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversionItem;

    const PAGE: &str = "https://example.com/currencies/gems";

    fn rate(source: &str, target: &str, rate: f64, text: &str) -> ExtractedRate {
        ExtractedRate {
            source: source.into(),
            target: target.into(),
            rate,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn test_page_projection_counts() {
        let backend = MemoryBackend::new();
        backend
            .add_page(
                PAGE,
                Some("Gems"),
                vec![Table::default(), Table::default()],
            )
            .await;
        backend
            .upsert_conversions(&UpsertRequest::single(
                PAGE,
                None,
                ConversionItem::new("Gem", "Coin", 120.0),
            ))
            .await
            .unwrap();

        let pages = backend.list_pages().await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].path, "/currencies/gems");
        assert_eq!(pages[0].table_count, 2);
        assert_eq!(pages[0].conversion_count, Some(1));
    }

    #[tokio::test]
    async fn test_missing_page_is_404() {
        let backend = MemoryBackend::new();
        match backend.get_page(PAGE).await {
            Err(CatalogError::Service { status, detail }) => {
                assert_eq!(status, Some(404));
                assert!(detail.contains(PAGE));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ocr_adds_staged_image_rates() {
        let backend = MemoryBackend::new();
        backend.add_page(PAGE, None, vec![]).await;
        backend
            .stage_extraction(
                PAGE,
                vec![rate("Gem", "Coin", 100.0, "1 Gem = 100 Coins")],
                vec![rate("Ruby", "Gem", 3.0, "ruby.png: 3 gems")],
            )
            .await;

        backend.extract(&ExtractRequest::new(PAGE, false)).await.unwrap();
        assert_eq!(backend.list_conversions(Some(PAGE)).await.unwrap().len(), 1);

        let response = backend.extract(&ExtractRequest::new(PAGE, true)).await.unwrap();
        assert_eq!(response["found"], 2);
        // Re-extraction corrects instead of duplicating.
        assert_eq!(backend.list_conversions(Some(PAGE)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fragment_url_corrects_extracted_rate() {
        let backend = MemoryBackend::new();
        backend.add_page(PAGE, Some("Gems"), vec![]).await;
        backend
            .stage_extraction(PAGE, vec![rate("Gem", "Coin", 100.0, "1 Gem = 100 Coins")], vec![])
            .await;

        let fragment = format!("{}#rates", PAGE);
        backend.extract(&ExtractRequest::new(&fragment, false)).await.unwrap();
        backend
            .upsert_conversions(&UpsertRequest::single(
                &fragment,
                None,
                ConversionItem::new("gem", "coin", 120.0),
            ))
            .await
            .unwrap();

        assert_eq!(backend.record_count().await, 1);
        let records = backend.list_conversions(Some(PAGE)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rate, 120.0);
        assert!(records[0].text.is_none());

        let pages = backend.list_pages().await.unwrap();
        assert_eq!(pages[0].conversion_count, Some(1));
    }

    #[tokio::test]
    async fn test_add_page_replaces_by_canonical_url() {
        let backend = MemoryBackend::new();
        backend.add_page(PAGE, Some("Gems"), vec![Table::default()]).await;
        backend
            .add_page(&format!("{}?tab=2#top", PAGE), Some("Gems v2"), vec![])
            .await;

        let pages = backend.list_pages().await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("Gems v2"));
        assert_eq!(pages[0].table_count, 0);
    }

    #[tokio::test]
    async fn test_scrape_unavailable() {
        let backend = MemoryBackend::new();
        let err = backend
            .scrape(&ScrapeRequest::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not available"));
    }
}
