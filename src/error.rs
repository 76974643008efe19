//! Error types for catalog operations.
//!
//! Every failure is scoped to the operation that triggered it. Validation and
//! in-flight refusals never reach the extraction service; transport and
//! service failures carry a single message meant to be shown verbatim.

use thiserror::Error;

/// Malformed operator input, rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Page URL is required")]
    EmptyPageUrl,

    #[error("URL is required")]
    EmptyUrl,

    #[error("At least one conversion is required")]
    NoItems,

    #[error("Source currency is required")]
    EmptySource,

    #[error("Target currency is required")]
    EmptyTarget,

    #[error("Rate must be a positive number, got {0:?}")]
    InvalidRate(String),

    #[error("Max pages must be between 1 and 200, got {0}")]
    MaxPagesOutOfRange(u32),
}

/// Coarse classification used by callers that only care where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Service,
}

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request did not complete (connection refused, reset, timeout).
    #[error("{0}")]
    Transport(String),

    /// The service answered with a non-2xx status or an unreadable body.
    #[error("{detail}")]
    Service { status: Option<u16>, detail: String },

    /// The same operation is already running for this page.
    #[error("{operation} already in progress for {key}")]
    InFlight { operation: &'static str, key: String },
}

impl CatalogError {
    pub fn service(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Service {
            status,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InFlight { .. } => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Service { .. } => ErrorKind::Service,
        }
    }

    /// True when the failure was decided locally and nothing was sent.
    pub fn is_local(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
