//! Error types for the fetch module.

use thiserror::Error;

/// Classified fetch failures.
///
/// Callers only need to tell a definitive absence from a failure worth
/// retrying; [`FetchError::is_absent`] and [`FetchError::is_transient`]
/// partition every variant except `Cancelled` and `InvalidUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The resource definitively does not exist (404-class).
    #[error("not found (status {status})")]
    NotFound { status: u16 },

    /// Server-side failure; may succeed later.
    #[error("server error (status {status})")]
    Status { status: u16 },

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The caller's deadline expired or the fetch was aborted.
    #[error("fetch cancelled")]
    Cancelled,

    /// The URL cannot be fetched by this fetcher.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => FetchError::NotFound { status },
            _ => FetchError::Status { status },
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Status { .. } | FetchError::Network(_))
    }

    /// Status code to report for a failed check. Network failures report 0.
    pub fn code(&self) -> u16 {
        match self {
            FetchError::NotFound { status } | FetchError::Status { status } => *status,
            _ => 0,
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
