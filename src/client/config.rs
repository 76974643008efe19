//! Extraction service client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Configuration for the HTTP extraction service client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service (no trailing `/api`).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Request timeout in seconds. `None` leaves timing to the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_user_agent() -> String {
    concat!("ratebook/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ServiceConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `RATEBOOK_BACKEND_URL` (or `BACKEND_URL`): service base URL
    /// - `RATEBOOK_REQUEST_TIMEOUT`: timeout in seconds, `0` to disable
    /// - `RATEBOOK_USER_AGENT`: user agent string
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RATEBOOK_BACKEND_URL").or_else(|_| std::env::var("BACKEND_URL"))
        {
            if !val.trim().is_empty() {
                self.backend_url = val;
            }
        }
        if let Ok(val) = std::env::var("RATEBOOK_REQUEST_TIMEOUT") {
            if let Ok(secs) = val.parse::<u64>() {
                self.request_timeout_secs = (secs > 0).then_some(secs);
            }
        }
        if let Ok(val) = std::env::var("RATEBOOK_USER_AGENT") {
            self.user_agent = val;
        }
        self
    }

    pub fn with_backend_url(mut self, backend_url: &str) -> Self {
        self.backend_url = backend_url.to_string();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Join an API path onto the backend URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), path)
    }
}
