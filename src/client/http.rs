//! HTTP implementation of the extraction service boundary.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::config::ServiceConfig;
use super::service::ExtractionService;
use crate::error::{CatalogError, Result};
use crate::models::{
    ConversionRecord, ExtractRequest, ItemsEnvelope, Page, PageDetail, ScrapeOutcome,
    ScrapeRequest, UpsertRequest,
};

/// Messages shown when a failed response carries no `detail`.
const LOAD_FAILED: &str = "Failed to load";
const UPSERT_FAILED: &str = "Failed";
const SCRAPE_FAILED: &str = "Failed to scrape";
const EXTRACT_FAILED: &str = "Extraction failed";

/// Client for the extraction service JSON API.
#[derive(Clone)]
pub struct HttpExtractionService {
    config: ServiceConfig,
    client: Client,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Decode the upsert response. Depending on service version the written
/// records come as `{items: [...]}`, a bare array or a single record; any
/// other object is an acknowledgement without records. A recognised shape
/// whose records do not decode is an error.
fn decode_upsert(body: serde_json::Value) -> serde_json::Result<Vec<ConversionRecord>> {
    use serde_json::Value;

    match body {
        Value::Object(mut map) if map.contains_key("items") => {
            let items = map.remove("items").unwrap_or(Value::Null);
            serde_json::from_value(items)
        }
        Value::Object(map) if map.contains_key("id") => {
            serde_json::from_value(Value::Object(map)).map(|record| vec![record])
        }
        Value::Object(_) => Ok(Vec::new()),
        other => serde_json::from_value(other),
    }
}

impl HttpExtractionService {
    /// Create a new client with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent).gzip(true);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CatalogError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Send a request and decode a 2xx JSON body into `T`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(CatalogError::service(
                Some(status.as_u16()),
                error_detail(&body).unwrap_or_else(|| fallback.to_string()),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            CatalogError::service(Some(status.as_u16()), format!("Malformed response: {}", e))
        })
    }
}

/// Pull the `detail` message out of an error body.
///
/// String details are used verbatim; structured ones (e.g. per-field
/// validation errors) are rendered as compact JSON.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn list_pages(&self) -> Result<Vec<Page>> {
        let url = self.config.endpoint("/api/pages");
        debug!("GET {}", url);
        let envelope: ItemsEnvelope<Page> =
            self.send_json(self.client.get(&url), LOAD_FAILED).await?;
        Ok(envelope.items)
    }

    async fn get_page(&self, page_url: &str) -> Result<PageDetail> {
        let url = self.config.endpoint("/api/page");
        debug!("GET {} url={}", url, page_url);
        let request = self.client.get(&url).query(&[("url", page_url)]);
        self.send_json(request, LOAD_FAILED).await
    }

    async fn list_conversions(&self, page_url: Option<&str>) -> Result<Vec<ConversionRecord>> {
        let url = self.config.endpoint("/api/conversions");
        debug!("GET {} page_url={:?}", url, page_url);
        let mut request = self.client.get(&url);
        if let Some(page_url) = page_url.filter(|u| !u.is_empty()) {
            request = request.query(&[("page_url", page_url)]);
        }
        let envelope: ItemsEnvelope<ConversionRecord> =
            self.send_json(request, LOAD_FAILED).await?;
        Ok(envelope.items)
    }

    async fn upsert_conversions(&self, body: &UpsertRequest) -> Result<Vec<ConversionRecord>> {
        let url = self.config.endpoint("/api/conversions/upsert");
        debug!("POST {} page_url={} items={}", url, body.page_url, body.items.len());
        let resp: serde_json::Value = self
            .send_json(self.client.post(&url).json(body), UPSERT_FAILED)
            .await?;
        decode_upsert(resp)
            .map_err(|e| CatalogError::service(None, format!("Malformed response: {}", e)))
    }

    async fn scrape(&self, body: &ScrapeRequest) -> Result<ScrapeOutcome> {
        let url = self.config.endpoint("/api/scrape");
        debug!("POST {} url={} crawl={} max_pages={}", url, body.url, body.crawl, body.max_pages);
        self.send_json(self.client.post(&url).json(body), SCRAPE_FAILED)
            .await
    }

    async fn extract(&self, body: &ExtractRequest) -> Result<serde_json::Value> {
        let url = self.config.endpoint("/api/extract");
        debug!("POST {} url={} ocr={}", url, body.url, body.ocr);
        self.send_json(self.client.post(&url).json(body), EXTRACT_FAILED)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_string() {
        assert_eq!(
            error_detail(r#"{"detail": "Page not found"}"#).as_deref(),
            Some("Page not found")
        );
    }

    #[test]
    fn test_error_detail_structured() {
        let detail = error_detail(r#"{"detail": [{"loc": ["body", "rate"]}]}"#).unwrap();
        assert!(detail.contains("rate"));
    }

    #[test]
    fn test_error_detail_missing() {
        assert_eq!(error_detail(r#"{"error": "nope"}"#), None);
        assert_eq!(error_detail("<html>502 Bad Gateway</html>"), None);
        assert_eq!(error_detail(r#"{"detail": ""}"#), None);
    }

    #[test]
    fn test_upsert_response_shapes() {
        let record = r#"{"id": 1, "page_url": "p", "source": "Gem", "target": "Coin", "rate": 120.0}"#;
        let decode = |body: String| decode_upsert(serde_json::from_str(&body).unwrap());

        assert_eq!(decode(format!(r#"{{"items": [{}]}}"#, record)).unwrap().len(), 1);
        assert_eq!(decode(format!("[{}]", record)).unwrap().len(), 1);
        assert_eq!(decode(record.to_string()).unwrap()[0].source, "Gem");
        assert!(decode(r#"{"ok": true, "updated": 1}"#.to_string())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_upsert_malformed_records_rejected() {
        let bad_items = serde_json::json!({"items": [{"id": "not-a-number", "source": "Gem"}]});
        assert!(decode_upsert(bad_items).is_err());

        let bad_record = serde_json::json!({"id": 1, "source": "Gem"});
        assert!(decode_upsert(bad_record).is_err());

        assert!(decode_upsert(serde_json::json!("saved")).is_err());
    }
}
