//! Reference extraction service.
//!
//! Serves the same JSON API the real scraping service exposes, backed by an
//! in-memory store. Used for local development, demos and integration tests.

mod handlers;
mod memory;
mod routes;
mod seed;

pub use memory::MemoryBackend;
pub use routes::create_router;
pub use seed::{SeedConversion, SeedData, SeedExtraction, SeedPage};

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<MemoryBackend>,
}

impl AppState {
    pub fn new(backend: MemoryBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Build state from an optional seed file.
    pub async fn from_seed_file(seed: Option<&Path>) -> anyhow::Result<Self> {
        let backend = match seed {
            Some(path) => {
                let data = SeedData::load(path).await?;
                tracing::info!(
                    "Loaded {} page(s) and {} conversion(s) from {}",
                    data.pages.len(),
                    data.conversions.len(),
                    path.display()
                );
                MemoryBackend::from_seed(data).await
            }
            None => MemoryBackend::new(),
        };
        Ok(Self::new(backend))
    }
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
