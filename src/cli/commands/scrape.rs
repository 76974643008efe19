//! Scrape command.

use console::style;

use crate::config::Settings;
use crate::models::ScrapeRequest;

use super::helpers::{catalog, fail, spinner};

/// Ask the service to fetch and store pages.
pub async fn cmd_scrape(
    settings: &Settings,
    url: &str,
    crawl: bool,
    max_pages: u32,
) -> anyhow::Result<()> {
    let catalog = catalog(settings)?;
    let request = ScrapeRequest::new(url)
        .with_crawl(crawl)
        .with_max_pages(max_pages);

    let pb = spinner(format!("Scraping {}...", request.url));
    let result = catalog.scrape(&request).await;
    pb.finish_and_clear();
    let outcome = result.map_err(|e| fail("Scrape", e))?;

    println!("{} {}", style("✓").green(), outcome.summary());
    Ok(())
}
