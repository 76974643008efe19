//! Last-fetched snapshots of catalog data.
//!
//! Every successful fetch replaces the stored snapshot for its key wholesale;
//! nothing is ever merged. Failed fetches leave the previous snapshot in place
//! so the last good state stays visible. Snapshots have no TTL: they live
//! until a mutation invalidates them.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::models::{canonical_page_url, ConversionRecord, Page, PageDetail, PairKey};

/// Which conversion listing a snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingKey {
    /// Unfiltered listing across all pages.
    All,
    /// Listing filtered to one page (canonical URL).
    Page(String),
}

impl ListingKey {
    pub fn for_filter(filter: Option<&str>) -> Self {
        match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(url) => Self::Page(canonical_page_url(url)),
            None => Self::All,
        }
    }
}

/// A value together with the time it was fetched.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
        }
    }
}

/// Cache of the most recent successful fetches.
pub struct SnapshotCache {
    conversions: RwLock<HashMap<ListingKey, Snapshot<Vec<ConversionRecord>>>>,
    pages: RwLock<HashMap<String, Snapshot<PageDetail>>>,
    page_list: RwLock<Option<Snapshot<Vec<Page>>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            conversions: RwLock::new(HashMap::new()),
            pages: RwLock::new(HashMap::new()),
            page_list: RwLock::new(None),
        }
    }

    /// Get the cached listing for a filter.
    pub fn conversions(&self, filter: Option<&str>) -> Option<Snapshot<Vec<ConversionRecord>>> {
        let key = ListingKey::for_filter(filter);
        self.conversions
            .read()
            .ok()
            .and_then(|guard| guard.get(&key).cloned())
    }

    /// Replace the cached listing for a filter.
    pub fn set_conversions(&self, filter: Option<&str>, records: Vec<ConversionRecord>) {
        if let Ok(mut guard) = self.conversions.write() {
            guard.insert(ListingKey::for_filter(filter), Snapshot::new(records));
        }
    }

    /// Look up a cached record for a page by case-insensitive pair.
    pub fn find_pair(&self, page_url: &str, source: &str, target: &str) -> Option<ConversionRecord> {
        let key = PairKey::new(source, target);
        self.conversions(Some(page_url))
            .and_then(|snap| snap.value.into_iter().find(|r| r.pair_key() == key))
    }

    pub fn page(&self, url: &str) -> Option<Snapshot<PageDetail>> {
        self.pages
            .read()
            .ok()
            .and_then(|guard| guard.get(&canonical_page_url(url)).cloned())
    }

    /// Replace the cached page and its tables.
    pub fn set_page(&self, url: &str, detail: PageDetail) {
        if let Ok(mut guard) = self.pages.write() {
            guard.insert(canonical_page_url(url), Snapshot::new(detail));
        }
    }

    pub fn page_list(&self) -> Option<Snapshot<Vec<Page>>> {
        self.page_list
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn set_page_list(&self, pages: Vec<Page>) {
        if let Ok(mut guard) = self.page_list.write() {
            *guard = Some(Snapshot::new(pages));
        }
    }

    /// Drop everything derived from one page: its listing, the unfiltered
    /// listing, its page snapshot and the page list (derived counts).
    pub fn invalidate_page(&self, url: &str) {
        let canonical = canonical_page_url(url);
        if let Ok(mut guard) = self.conversions.write() {
            guard.remove(&ListingKey::Page(canonical.clone()));
            guard.remove(&ListingKey::All);
        }
        if let Ok(mut guard) = self.pages.write() {
            guard.remove(&canonical);
        }
        self.invalidate_page_list();
    }

    pub fn invalidate_page_list(&self) {
        if let Ok(mut guard) = self.page_list.write() {
            *guard = None;
        }
    }

    /// Drop every snapshot.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.conversions.write() {
            guard.clear();
        }
        if let Ok(mut guard) = self.pages.write() {
            guard.clear();
        }
        self.invalidate_page_list();
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}
