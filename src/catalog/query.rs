//! Conversion listings.

use tracing::{debug, warn};

use super::inflight::Operation;
use super::{normalize_filter, Catalog};
use crate::error::{CatalogError, Result};
use crate::models::ConversionRecord;

/// Result of a catalog query. Failures are carried as state, never thrown.
#[derive(Debug)]
pub struct ConversionListing {
    /// Filter the listing was requested with (`None` = all pages).
    pub filter: Option<String>,
    /// Records in server order; empty when the load failed.
    pub items: Vec<ConversionRecord>,
    /// Set when the load failed.
    pub load_error: Option<CatalogError>,
}

impl ConversionListing {
    pub fn is_failed(&self) -> bool {
        self.load_error.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Catalog {
    /// Fetch conversions, optionally restricted to one page URL (exact match).
    ///
    /// Records are returned in server order. A successful fetch replaces the
    /// cached snapshot for this filter, unless an invalidation was published
    /// while the request was running.
    pub async fn try_list_conversions(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<ConversionRecord>> {
        let filter = normalize_filter(filter);
        let _loading = self
            .inflight
            .track(Operation::LoadConversions, filter.unwrap_or(""));

        let generation = self.generation();
        let records = self.service.list_conversions(filter).await?;
        let records = match filter {
            Some(url) => {
                let total = records.len();
                let kept: Vec<_> = records.into_iter().filter(|r| r.belongs_to(url)).collect();
                if kept.len() != total {
                    warn!(
                        "Dropped {} conversion(s) not belonging to {}",
                        total - kept.len(),
                        url
                    );
                }
                kept
            }
            None => records,
        };

        debug!("Loaded {} conversion(s) for {:?}", records.len(), filter);
        if self.generation() == generation {
            self.cache.set_conversions(filter, records.clone());
        } else {
            debug!("Not caching conversions for {:?}: invalidated during load", filter);
        }
        Ok(records)
    }

    /// Fetch conversions, capturing any failure in the listing.
    ///
    /// On failure the listing is empty and `load_error` is set; the previous
    /// snapshot stays available through [`Catalog::cached_conversions`].
    pub async fn list_conversions(&self, filter: Option<&str>) -> ConversionListing {
        let filter_owned = normalize_filter(filter).map(str::to_string);
        match self.try_list_conversions(filter).await {
            Ok(items) => ConversionListing {
                filter: filter_owned,
                items,
                load_error: None,
            },
            Err(e) => {
                warn!("Failed to load conversions for {:?}: {}", filter_owned, e);
                ConversionListing {
                    filter: filter_owned,
                    items: Vec::new(),
                    load_error: Some(e),
                }
            }
        }
    }

    /// Last successfully loaded listing for a filter.
    pub fn cached_conversions(&self, filter: Option<&str>) -> Option<Vec<ConversionRecord>> {
        self.cache
            .conversions(normalize_filter(filter))
            .map(|snap| snap.value)
    }
}
