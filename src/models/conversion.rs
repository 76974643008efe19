//! Conversion rate records and the requests that create or correct them.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A directional rate fact: 1 unit of `source` is worth `rate` units of `target`.
///
/// Records are unique per (page, source, target) with currency names compared
/// case-insensitively. The inverse direction is an independent record and is
/// never derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: i64,
    /// Owning page. Absent for global/reference rates.
    #[serde(default)]
    pub page_url: Option<String>,
    /// Denormalized page title, possibly stale.
    #[serde(default)]
    pub page_title: Option<String>,
    pub source: String,
    pub target: String,
    pub rate: f64,
    /// Raw text the rate was extracted from. Absent for manual entries.
    #[serde(default)]
    pub text: Option<String>,
}

impl ConversionRecord {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.source, &self.target)
    }

    /// Page title, else page URL, for listing where a rate came from.
    pub fn origin_label(&self) -> &str {
        match (self.page_title.as_deref(), self.page_url.as_deref()) {
            (Some(title), _) if !title.trim().is_empty() => title,
            (_, Some(url)) => url,
            _ => "(global)",
        }
    }

    pub fn is_manual(&self) -> bool {
        self.text.is_none()
    }

    pub fn belongs_to(&self, page_url: &str) -> bool {
        self.page_url.as_deref() == Some(page_url)
    }
}

impl std::fmt::Display for ConversionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1 {} → {} {}", self.source, self.rate, self.target)
    }
}

/// Case-insensitive identity of a (source, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    source: String,
    target: String,
}

impl PairKey {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.trim().to_lowercase(),
            target: target.trim().to_lowercase(),
        }
    }
}

/// One submitted rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionItem {
    pub source: String,
    pub target: String,
    pub rate: f64,
}

impl ConversionItem {
    pub fn new(source: &str, target: &str, rate: f64) -> Self {
        Self {
            source: source.trim().to_string(),
            target: target.trim().to_string(),
            rate,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.source, &self.target)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source.trim().is_empty() {
            return Err(ValidationError::EmptySource);
        }
        if self.target.trim().is_empty() {
            return Err(ValidationError::EmptyTarget);
        }
        check_rate(self.rate)
    }
}

fn check_rate(rate: f64) -> Result<(), ValidationError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidRate(rate.to_string()))
    }
}

/// Parse operator-entered rate text.
pub fn parse_rate(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    let rate: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidRate(trimmed.to_string()))?;
    check_rate(rate).map_err(|_| ValidationError::InvalidRate(trimmed.to_string()))?;
    Ok(rate)
}

/// Body of `POST /api/conversions/upsert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    pub items: Vec<ConversionItem>,
}

impl UpsertRequest {
    /// Build a request from raw form values. Values are trimmed and an empty
    /// title is dropped.
    pub fn new(page_url: &str, page_title: Option<&str>, items: Vec<ConversionItem>) -> Self {
        Self {
            page_url: page_url.trim().to_string(),
            page_title: page_title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            items,
        }
    }

    pub fn single(page_url: &str, page_title: Option<&str>, item: ConversionItem) -> Self {
        Self::new(page_url, page_title, vec![item])
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_url.trim().is_empty() {
            return Err(ValidationError::EmptyPageUrl);
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        self.items.iter().try_for_each(ConversionItem::validate)
    }
}

/// Largest crawl the scrape form accepts.
pub const MAX_SCRAPE_PAGES: u32 = 200;

/// Body of `POST /api/scrape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default = "default_crawl")]
    pub crawl: bool,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_crawl() -> bool {
    true
}

fn default_max_pages() -> u32 {
    10
}

impl ScrapeRequest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            crawl: default_crawl(),
            max_pages: default_max_pages(),
        }
    }

    pub fn with_crawl(mut self, crawl: bool) -> Self {
        self.crawl = crawl;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        if !(1..=MAX_SCRAPE_PAGES).contains(&self.max_pages) {
            return Err(ValidationError::MaxPagesOutOfRange(self.max_pages));
        }
        Ok(())
    }
}

/// Body of `POST /api/extract`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
    #[serde(default)]
    pub ocr: bool,
}

impl ExtractRequest {
    pub fn new(url: &str, ocr: bool) -> Self {
        Self {
            url: url.trim().to_string(),
            ocr,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        Ok(())
    }
}
