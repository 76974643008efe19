//! In-flight operation tracking.
//!
//! Mutating operations (upsert, extraction, scrape) are exclusive per page:
//! a second request of the same kind for the same page is refused while the
//! first is running, since nothing downstream deduplicates them. Loads are
//! only tracked so callers can show a loading state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::CatalogError;
use crate::models::canonical_page_url;

/// Kinds of operation with an observable in-flight state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadConversions,
    LoadPage,
    LoadPages,
    Upsert,
    Extract,
    Scrape,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadConversions => "conversion load",
            Self::LoadPage => "page load",
            Self::LoadPages => "page list load",
            Self::Upsert => "upsert",
            Self::Extract => "extraction",
            Self::Scrape => "scrape",
        }
    }
}

type Slot = (Operation, String);

/// Shared registry of running operations.
#[derive(Clone, Default)]
pub struct InFlight {
    running: Arc<Mutex<HashMap<Slot, usize>>>,
}

/// Marks an operation as running until dropped.
pub struct InFlightGuard {
    running: Arc<Mutex<HashMap<Slot, usize>>>,
    slot: Slot,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(op: Operation, key: &str) -> Slot {
        (op, canonical_page_url(key))
    }

    /// Start an exclusive operation, refusing if one is already running.
    pub fn begin(&self, op: Operation, key: &str) -> Result<InFlightGuard, CatalogError> {
        let slot = Self::slot(op, key);
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if running.get(&slot).copied().unwrap_or(0) > 0 {
            return Err(CatalogError::InFlight {
                operation: op.as_str(),
                key: slot.1,
            });
        }
        running.insert(slot.clone(), 1);
        Ok(InFlightGuard {
            running: Arc::clone(&self.running),
            slot,
        })
    }

    /// Record a non-exclusive operation (overlapping loads are allowed).
    pub fn track(&self, op: Operation, key: &str) -> InFlightGuard {
        let slot = Self::slot(op, key);
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *running.entry(slot.clone()).or_insert(0) += 1;
        InFlightGuard {
            running: Arc::clone(&self.running),
            slot,
        }
    }

    pub fn is_running(&self, op: Operation, key: &str) -> bool {
        let slot = Self::slot(op, key);
        self.running
            .lock()
            .map(|running| running.get(&slot).copied().unwrap_or(0) > 0)
            .unwrap_or(false)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(count) = running.get_mut(&self.slot) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                running.remove(&self.slot);
            }
        }
    }
}
