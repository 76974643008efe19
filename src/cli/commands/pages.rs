//! Page browsing commands.

use console::style;

use crate::config::Settings;

use super::helpers::{catalog, fail, print_rates, print_table, spinner, truncate};

/// List pages, optionally narrowed by title/path text.
pub async fn cmd_pages(settings: &Settings, filter: Option<&str>) -> anyhow::Result<()> {
    let catalog = catalog(settings)?;

    let pb = spinner("Loading pages...");
    let result = catalog.list_pages(filter).await;
    pb.finish_and_clear();
    let pages = result.map_err(|e| fail("Loading pages", e))?;

    if pages.is_empty() {
        match filter {
            Some(f) => println!("{} No pages match '{}'", style("!").yellow(), f),
            None => println!(
                "{} No pages stored yet. Run 'ratebook scrape <URL>' first.",
                style("!").yellow()
            ),
        }
        return Ok(());
    }

    println!("\n{}", style("Pages").bold());
    println!("{}", "-".repeat(90));
    println!("{:<30} {:<45} {:>6} {:>6}", "Title", "URL", "Tables", "Rates");
    println!("{}", "-".repeat(90));

    for page in &pages {
        let rates = page
            .conversion_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<30} {:<45} {:>6} {:>6}",
            truncate(page.display_title(), 29),
            truncate(&page.url, 44),
            page.table_count,
            rates
        );
    }
    println!("\n{} page(s)", pages.len());

    Ok(())
}

/// Show one page: header, detected rates, then tables.
pub async fn cmd_page(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let catalog = catalog(settings)?;

    let pb = spinner(format!("Loading {}...", url));
    let view = catalog.open_page(url).await;
    pb.finish_and_clear();

    let detail = match view.page {
        Ok(detail) => Some(detail),
        Err(e) if view.rates.is_failed() => return Err(fail("Loading page", e)),
        Err(e) => {
            println!("{} Failed to load page: {}", style("!").yellow(), e);
            None
        }
    };

    match &detail {
        Some(detail) => {
            println!("\n{}", style(detail.page.display_title()).bold());
            println!("{}", style(&detail.page.url).dim());
        }
        None => println!("\n{}", style(&view.url).bold()),
    }

    println!("\n{}", style("Detected rates").bold());
    print_rates(&view.rates, false);

    if let Some(detail) = detail {
        let mut shown = 0;
        for (index, table) in detail.visible_tables() {
            print_table(index + 1, table);
            shown += 1;
        }
        if shown == 0 {
            println!("\n  {}", style("No tables on this page").dim());
        }
    }

    Ok(())
}
