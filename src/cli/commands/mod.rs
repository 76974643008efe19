//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod conversions;
mod extract;
mod helpers;
mod pages;
mod scrape;
mod serve;
mod upsert;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "ratebook")]
#[command(about = "Browse scraped pages and curate game-currency conversion rates")]
#[command(version)]
pub struct Cli {
    /// Extraction service base URL (overrides the config file)
    #[arg(long, short = 'b', global = true, env = "RATEBOOK_BACKEND_URL")]
    backend: Option<String>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// List scraped pages
    Pages {
        /// Only pages whose title or path contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show a page with its detected rates and tables
    Page {
        /// Page URL
        url: String,
    },

    /// List conversion rates
    Conversions {
        /// Only rates belonging to this page (exact URL)
        #[arg(long)]
        page_url: Option<String>,
    },

    /// Add or correct a conversion rate on a page
    Upsert {
        /// Page the rate belongs to
        #[arg(long)]
        page_url: String,
        /// Page title to store alongside the rate
        #[arg(long)]
        page_title: Option<String>,
        /// Source currency
        #[arg(long)]
        source: String,
        /// Target currency
        #[arg(long)]
        target: String,
        /// Units of target per one unit of source
        #[arg(long)]
        rate: String,
    },

    /// Fetch and store pages starting at a URL
    Scrape {
        /// Start URL
        url: String,
        /// Only fetch the start page
        #[arg(long)]
        no_crawl: bool,
        /// Maximum pages to fetch (1-200)
        #[arg(long, default_value = "10")]
        max_pages: u32,
    },

    /// Derive conversion rates from a stored page
    Extract {
        /// Page URL
        url: String,
        /// Also read image metadata and labels
        #[arg(long)]
        ocr: bool,
    },

    /// Run the in-memory reference service
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
        /// Seed file (JSON, TOML or YAML) with pages, rates and staged extractions
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        backend_url: cli.backend,
    };
    let settings = load_settings(options).await?;

    match cli.command {
        Commands::Pages { filter } => pages::cmd_pages(&settings, filter.as_deref()).await,
        Commands::Page { url } => pages::cmd_page(&settings, &url).await,
        Commands::Conversions { page_url } => {
            conversions::cmd_conversions(&settings, page_url.as_deref()).await
        }
        Commands::Upsert {
            page_url,
            page_title,
            source,
            target,
            rate,
        } => {
            let form = crate::catalog::ConversionForm {
                page_url,
                page_title: page_title.unwrap_or_default(),
                source,
                target,
                rate,
            };
            upsert::cmd_upsert(&settings, form).await
        }
        Commands::Scrape {
            url,
            no_crawl,
            max_pages,
        } => scrape::cmd_scrape(&settings, &url, !no_crawl, max_pages).await,
        Commands::Extract { url, ocr } => extract::cmd_extract(&settings, &url, ocr).await,
        Commands::Serve { host, port, seed } => {
            serve::cmd_serve(&host, port, seed.as_deref()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upsert() {
        let cli = Cli::try_parse_from([
            "ratebook",
            "--backend",
            "http://scraper:9000",
            "upsert",
            "--page-url",
            "https://example.com/gems",
            "--source",
            "Gem",
            "--target",
            "Coin",
            "--rate",
            "120",
        ])
        .unwrap();
        assert_eq!(cli.backend.as_deref(), Some("http://scraper:9000"));
        match cli.command {
            Commands::Upsert {
                page_title, rate, ..
            } => {
                assert!(page_title.is_none());
                assert_eq!(rate, "120");
            }
            _ => panic!("expected upsert"),
        }
    }

    #[test]
    fn test_backend_reads_environment() {
        let cmd = Cli::command();
        let backend = cmd
            .get_arguments()
            .find(|arg| arg.get_id() == "backend")
            .unwrap();
        assert_eq!(
            backend.get_env(),
            Some(std::ffi::OsStr::new("RATEBOOK_BACKEND_URL"))
        );
    }

    #[test]
    fn test_parse_scrape_defaults() {
        let cli = Cli::try_parse_from(["ratebook", "scrape", "https://example.com"]).unwrap();
        match cli.command {
            Commands::Scrape {
                no_crawl,
                max_pages,
                ..
            } => {
                assert!(!no_crawl);
                assert_eq!(max_pages, 10);
            }
            _ => panic!("expected scrape"),
        }
    }
}
