//! Seed data for the in-memory service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{ConversionItem, Table};
use crate::store::ExtractedRate;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub pages: Vec<SeedPage>,
    #[serde(default)]
    pub conversions: Vec<SeedConversion>,
    #[serde(default)]
    pub extractions: Vec<SeedExtraction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPage {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConversion {
    /// Omit for a global rate.
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub page_title: Option<String>,
    pub source: String,
    pub target: String,
    pub rate: f64,
}

impl SeedConversion {
    pub fn item(&self) -> ConversionItem {
        ConversionItem::new(&self.source, &self.target, self.rate)
    }
}

/// Rates the service reports when a page is extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedExtraction {
    pub page_url: String,
    #[serde(default)]
    pub text: Vec<ExtractedRate>,
    #[serde(default)]
    pub ocr: Vec<ExtractedRate>,
}

impl SeedData {
    /// Load seed data from a JSON, TOML or YAML file (by extension).
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let seed: Self = match ext {
            "toml" => toml::from_str(&contents)?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        Ok(seed)
    }
}
