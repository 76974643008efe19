//! Conversion listing command.

use console::style;

use crate::config::Settings;

use super::helpers::{catalog, fail, print_rates, spinner};

/// List conversion rates, all pages or one exact page URL.
pub async fn cmd_conversions(settings: &Settings, page_url: Option<&str>) -> anyhow::Result<()> {
    let catalog = catalog(settings)?;

    let pb = spinner("Loading conversion rates...");
    let mut listing = catalog.list_conversions(page_url).await;
    pb.finish_and_clear();

    if let Some(err) = listing.load_error.take() {
        return Err(fail("Loading conversions", err));
    }

    let heading = match &listing.filter {
        Some(url) => format!("Conversion rates for {}", url),
        None => "Conversion rates".to_string(),
    };
    println!("\n{}", style(heading).bold());
    print_rates(&listing, listing.filter.is_none());
    println!("\n{} rate(s)", listing.len());

    Ok(())
}
