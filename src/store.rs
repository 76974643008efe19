//! In-memory conversion store with upsert/correction semantics.
//!
//! Records are unique per (page, source, target), currency names compared
//! case-insensitively. Writing an existing pair replaces its rate in place,
//! so the page's record count and the record's id and position are kept.

use serde::{Deserialize, Serialize};

use crate::models::{ConversionItem, ConversionRecord, PairKey};

/// A rate found by extraction, with the text it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRate {
    pub source: String,
    pub target: String,
    pub rate: f64,
    pub text: String,
}

/// Insertion-ordered conversion records.
#[derive(Debug, Clone)]
pub struct ConversionStore {
    records: Vec<ConversionRecord>,
    next_id: i64,
}

impl ConversionStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Records in insertion order, restricted to one page when `page_url` is set.
    pub fn list(&self, page_url: Option<&str>) -> Vec<ConversionRecord> {
        match page_url {
            Some(url) => self
                .records
                .iter()
                .filter(|r| r.belongs_to(url))
                .cloned()
                .collect(),
            None => self.records.clone(),
        }
    }

    pub fn count_for(&self, page_url: &str) -> usize {
        self.records.iter().filter(|r| r.belongs_to(page_url)).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply manual submissions. Corrections clear the provenance text.
    pub fn upsert(
        &mut self,
        page_url: &str,
        page_title: Option<&str>,
        items: &[ConversionItem],
    ) -> Vec<ConversionRecord> {
        items
            .iter()
            .map(|item| {
                self.write(
                    Some(page_url),
                    page_title,
                    &item.source,
                    &item.target,
                    item.rate,
                    None,
                )
            })
            .collect()
    }

    /// Apply extraction results, keeping the snippet each rate came from.
    pub fn apply_extracted(
        &mut self,
        page_url: &str,
        page_title: Option<&str>,
        rates: &[ExtractedRate],
    ) -> Vec<ConversionRecord> {
        rates
            .iter()
            .map(|r| {
                self.write(
                    Some(page_url),
                    page_title,
                    &r.source,
                    &r.target,
                    r.rate,
                    Some(r.text.clone()),
                )
            })
            .collect()
    }

    /// Store a rate that belongs to no page.
    pub fn insert_global(&mut self, source: &str, target: &str, rate: f64) -> ConversionRecord {
        self.write(None, None, source, target, rate, None)
    }

    fn write(
        &mut self,
        page_url: Option<&str>,
        page_title: Option<&str>,
        source: &str,
        target: &str,
        rate: f64,
        text: Option<String>,
    ) -> ConversionRecord {
        let key = PairKey::new(source, target);
        let page_title = page_title.filter(|t| !t.trim().is_empty());

        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.page_url.as_deref() == page_url && r.pair_key() == key)
        {
            existing.rate = rate;
            existing.text = text;
            if let Some(title) = page_title {
                existing.page_title = Some(title.to_string());
            }
            return existing.clone();
        }

        let record = ConversionRecord {
            id: self.next_id,
            page_url: page_url.map(str::to_string),
            page_title: page_title.map(str::to_string),
            source: source.trim().to_string(),
            target: target.trim().to_string(),
            rate,
            text,
        };
        self.next_id += 1;
        self.records.push(record.clone());
        record
    }
}

impl Default for ConversionStore {
    fn default() -> Self {
        Self::new()
    }
}
