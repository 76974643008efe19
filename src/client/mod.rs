//! Client side of the extraction service boundary.
//!
//! The service itself (crawler, table parser, OCR, persistence) lives
//! elsewhere; this module only speaks its JSON API.

mod config;
mod http;
mod service;

pub use config::{ServiceConfig, DEFAULT_BACKEND_URL};
pub use http::HttpExtractionService;
pub use service::ExtractionService;
