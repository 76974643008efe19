//! Page and table models.
//!
//! Pages are created and owned by the extraction service when a scrape stores
//! a fetched document. This crate only ever holds read-only projections.

use serde::{Deserialize, Serialize};
use url::Url;

/// A scraped document as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Server row ID, when the service exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Canonical URL identifying the page.
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub table_count: u32,
    /// Number of conversion records tied to this page (older services omit it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_count: Option<u32>,
}

impl Page {
    /// Title for display, falling back to the path when the page has none.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.path,
        }
    }

    /// Case-insensitive substring match against title or path.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
            || self.path.to_lowercase().contains(&needle)
    }
}

/// Header/row grid extracted from a page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// A row whose width disagrees with the table's column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl std::fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} has {} cells, expected {}",
            self.row + 1,
            self.found,
            self.expected
        )
    }
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header count, or the first row's width when headers are empty.
    pub fn column_count(&self) -> usize {
        if self.headers.is_empty() {
            self.rows.first().map(Vec::len).unwrap_or(0)
        } else {
            self.headers.len()
        }
    }

    /// Headers to display. Synthesizes `Col 1..N` when the table has none.
    pub fn effective_headers(&self) -> Vec<String> {
        if !self.headers.is_empty() {
            return self.headers.clone();
        }
        (1..=self.column_count())
            .map(|i| format!("Col {}", i))
            .collect()
    }

    /// Every row must have exactly `column_count()` cells.
    pub fn check_shape(&self) -> Result<(), ShapeMismatch> {
        let expected = self.column_count();
        match self.rows.iter().position(|r| r.len() != expected) {
            Some(row) => Err(ShapeMismatch {
                row,
                expected,
                found: self.rows[row].len(),
            }),
            None => Ok(()),
        }
    }
}

/// A page with its tables embedded, as returned by `GET /api/page`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    #[serde(flatten)]
    pub page: Page,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl PageDetail {
    /// Validate every table, reporting the first offending one (zero-based).
    pub fn check_shape(&self) -> Result<(), (usize, ShapeMismatch)> {
        for (i, table) in self.tables.iter().enumerate() {
            table.check_shape().map_err(|e| (i, e))?;
        }
        Ok(())
    }

    /// Tables that have at least one row.
    pub fn visible_tables(&self) -> impl Iterator<Item = (usize, &Table)> {
        self.tables.iter().enumerate().filter(|(_, t)| !t.is_empty())
    }
}

/// Normalize a page URL to scheme + host + path (no query, no fragment).
///
/// Input that does not parse as an absolute URL is returned trimmed.
pub fn canonical_page_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) if url.has_host() => {
            url.set_fragment(None);
            url.set_query(None);
            url.to_string()
        }
        _ => trimmed.to_string(),
    }
}
