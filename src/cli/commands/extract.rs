//! Extraction command.

use console::style;

use crate::config::Settings;

use super::helpers::{catalog, fail, print_rates, spinner};

/// Derive conversion rates from a stored page, optionally with OCR.
pub async fn cmd_extract(settings: &Settings, url: &str, ocr: bool) -> anyhow::Result<()> {
    let catalog = catalog(settings)?;

    let message = if ocr {
        format!("Extracting rates from {} (with OCR)...", url)
    } else {
        format!("Extracting rates from {}...", url)
    };
    let pb = spinner(message);
    let result = catalog.request_extraction(url, ocr).await;
    pb.finish_and_clear();
    let outcome = result.map_err(|e| fail("Extraction", e))?;

    println!("{} Extraction finished", style("✓").green());
    println!("\n{}", style("Detected rates").bold());
    print_rates(&outcome.refreshed, false);

    Ok(())
}
