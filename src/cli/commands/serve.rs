//! Reference service command.

use std::path::Path;

use console::style;

use crate::server::AppState;

/// Start the in-memory extraction service.
pub async fn cmd_serve(host: &str, port: u16, seed: Option<&Path>) -> anyhow::Result<()> {
    let state = AppState::from_seed_file(seed).await?;

    if let Some(path) = seed {
        println!("{} Seeded from {}", style("→").cyan(), path.display());
    }
    println!(
        "{} Starting ratebook reference service at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(state, host, port).await
}
