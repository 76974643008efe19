//! Shared helper functions for CLI commands.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{Catalog, ConversionListing};
use crate::client::HttpExtractionService;
use crate::config::Settings;
use crate::error::{CatalogError, ErrorKind};
use crate::models::Table;

/// Build a catalog talking to the configured service.
pub fn catalog(settings: &Settings) -> anyhow::Result<Catalog> {
    let service = HttpExtractionService::new(settings.service.clone())?;
    Ok(Catalog::new(service))
}

/// Spinner shown while a request is in flight.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Print a failed operation and turn it into the command's error.
pub fn fail(context: &str, err: CatalogError) -> anyhow::Error {
    let label = match err.kind() {
        ErrorKind::Validation => "Invalid input",
        ErrorKind::Transport => "Service unreachable",
        ErrorKind::Service => "Service error",
    };
    eprintln!("{} {}: {}", style("✗").red(), label, err);
    anyhow::anyhow!("{} failed", context)
}

/// Print a conversion listing, or its load error.
pub fn print_rates(listing: &ConversionListing, show_origin: bool) {
    if let Some(err) = &listing.load_error {
        println!("{} Failed to load rates: {}", style("!").yellow(), err);
        return;
    }
    if listing.is_empty() {
        println!("  {}", style("No conversion rates").dim());
        return;
    }

    for record in &listing.items {
        let mut line = format!("  {}", record);
        if show_origin {
            line.push_str(&format!("  {}", style(record.origin_label()).dim()));
        }
        if let Some(text) = record.text.as_deref().filter(|t| !t.is_empty()) {
            line.push_str(&format!("  {}", style(format!("\"{}\"", truncate(text, 40))).dim()));
        }
        println!("{}", line);
    }
}

/// Column widths fitting headers and cells, capped at `max`.
fn column_widths(headers: &[String], rows: &[Vec<String>], max: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    widths.into_iter().map(|w| w.min(max)).collect()
}

/// Render one table with its effective headers.
pub fn print_table(number: usize, table: &Table) {
    let headers = table.effective_headers();
    let widths = column_widths(&headers, &table.rows, 30);
    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", truncate(cell, *w), width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("\n{}", style(format!("Table {}", number)).bold());
    println!("{}", style(render(&headers)).cyan());
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    for row in &table.rows {
        println!("{}", render(row));
    }
}
