//! Conversion-rate catalog and page/table association.
//!
//! [`Catalog`] sits in front of an [`ExtractionService`] and owns the only
//! shared state in the crate: the last successfully fetched snapshot per
//! page. Operations are split across submodules:
//! - `query.rs`: conversion listings
//! - `upsert.rs`: manual submissions and corrections
//! - `pages.rs`: pages, their tables and their rates
//! - `extraction.rs`: extraction and scrape triggers
//!
//! Mutations never patch cached data. On success they invalidate the affected
//! snapshots, publish an [`Invalidation`] and refetch.

mod cache;
mod extraction;
mod inflight;
mod pages;
mod query;
mod upsert;

pub use cache::{ListingKey, Snapshot, SnapshotCache};
pub use extraction::ExtractionOutcome;
pub use inflight::{InFlight, InFlightGuard, Operation};
pub use pages::PageView;
pub use query::ConversionListing;
pub use upsert::{ConversionForm, UpsertOutcome};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::client::ExtractionService;
use crate::models::canonical_page_url;

/// What a published invalidation covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Nothing has been invalidated yet.
    Initial,
    /// Rates (and possibly tables) of one page changed.
    Page(String),
    /// The set of stored pages changed.
    Pages,
}

/// Signal telling observers to refetch instead of trusting what they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    /// Increments on every published invalidation.
    pub generation: u64,
    pub scope: InvalidationScope,
}

impl Invalidation {
    /// Whether an observer showing `page_url` must refetch.
    pub fn affects(&self, page_url: &str) -> bool {
        match &self.scope {
            InvalidationScope::Initial => false,
            InvalidationScope::Page(url) => *url == canonical_page_url(page_url),
            InvalidationScope::Pages => true,
        }
    }
}

/// Client-side view of the conversion catalog.
pub struct Catalog {
    service: Arc<dyn ExtractionService>,
    cache: SnapshotCache,
    inflight: InFlight,
    invalidations: watch::Sender<Invalidation>,
}

impl Catalog {
    pub fn new(service: impl ExtractionService + 'static) -> Self {
        Self::from_arc(Arc::new(service))
    }

    pub fn from_arc(service: Arc<dyn ExtractionService>) -> Self {
        let (invalidations, _) = watch::channel(Invalidation {
            generation: 0,
            scope: InvalidationScope::Initial,
        });
        Self {
            service,
            cache: SnapshotCache::new(),
            inflight: InFlight::new(),
            invalidations,
        }
    }

    /// Last fetched snapshots.
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Observe invalidations published by upserts, extractions and scrapes.
    pub fn subscribe(&self) -> watch::Receiver<Invalidation> {
        self.invalidations.subscribe()
    }

    pub fn is_in_flight(&self, op: Operation, key: &str) -> bool {
        self.inflight.is_running(op, key)
    }

    /// Generation of the most recent invalidation.
    fn generation(&self) -> u64 {
        self.invalidations.borrow().generation
    }

    fn publish(&self, scope: InvalidationScope) {
        debug!("Invalidating {:?}", scope);
        self.invalidations.send_modify(|inv| {
            inv.generation += 1;
            inv.scope = scope;
        });
    }

    fn invalidate_page(&self, url: &str) {
        self.cache.invalidate_page(url);
        self.publish(InvalidationScope::Page(canonical_page_url(url)));
    }

    fn invalidate_page_list(&self) {
        self.cache.invalidate_page_list();
        self.publish(InvalidationScope::Pages);
    }
}

/// Trim a filter and treat blank as "no filter".
fn normalize_filter(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|f| !f.is_empty())
}
