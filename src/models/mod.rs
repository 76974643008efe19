//! Data models for ratebook.

mod conversion;
mod page;

pub use conversion::{
    parse_rate, ConversionItem, ConversionRecord, ExtractRequest, PairKey, ScrapeRequest,
    UpsertRequest, MAX_SCRAPE_PAGES,
};
pub use page::{canonical_page_url, Page, PageDetail, ShapeMismatch, Table};

use serde::{Deserialize, Serialize};

/// `{items: [...]}` envelope used by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Response of `POST /api/scrape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub pages_saved: u32,
}

impl ScrapeOutcome {
    pub fn summary(&self) -> String {
        format!("Saved {} page(s)", self.pages_saved)
    }
}
