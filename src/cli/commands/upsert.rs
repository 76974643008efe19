//! Manual conversion entry.

use console::style;

use crate::catalog::ConversionForm;
use crate::config::Settings;

use super::helpers::{catalog, fail, print_rates, spinner};

/// Add or correct one conversion rate on a page.
pub async fn cmd_upsert(settings: &Settings, form: ConversionForm) -> anyhow::Result<()> {
    let catalog = catalog(settings)?;
    let page_url = form.page_url.trim().to_string();

    let pb = spinner(format!("Saving rate for {}...", page_url));
    let result = catalog.submit(form).await;
    pb.finish_and_clear();
    let outcome = result.map_err(|e| fail("Saving rate", e))?;

    for record in &outcome.saved {
        println!("{} Saved {}", style("✓").green(), record);
    }
    if outcome.saved.is_empty() {
        println!("{} Saved", style("✓").green());
    }

    println!("\n{}", style(format!("Rates for {}", page_url)).bold());
    print_rates(&outcome.refreshed, false);

    Ok(())
}
