//! Configuration management for ratebook using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::ServiceConfig;

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Base URL of the extraction service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers ratebook config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ratebook").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Service settings from this file, before environment overrides.
    pub fn service_config(&self) -> ServiceConfig {
        let mut service = ServiceConfig::default();
        if let Some(url) = self.backend_url.as_deref().filter(|u| !u.trim().is_empty()) {
            service.backend_url = url.to_string();
        }
        if let Some(secs) = self.request_timeout_secs {
            service.request_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(ua) = &self.user_agent {
            service.user_agent = ua.clone();
        }
        service
    }
}

/// Options that influence how settings are resolved.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (`--config`).
    pub config_path: Option<PathBuf>,
    /// Explicit backend URL (`--backend`), wins over everything else.
    pub backend_url: Option<String>,
}

/// Resolved application settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceConfig,
    /// File the settings were read from, if any.
    pub config_path: Option<PathBuf>,
}

/// Resolve settings: defaults, then config file, then environment, then CLI.
pub async fn load_settings(options: LoadOptions) -> anyhow::Result<Settings> {
    let config = match &options.config_path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };
    if let Some(path) = &config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let mut service = config.service_config().with_env_overrides();
    if let Some(url) = options.backend_url.as_deref() {
        service = service.with_backend_url(url);
    }

    Ok(Settings {
        service,
        config_path: config.source_path,
    })
}
