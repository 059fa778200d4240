//! Error types for keyproof.

use keyproof_core::{ChainError, CoreError, Kid};
use keyproof_fetch::FetchError;
use keyproof_store::StoreError;
use thiserror::Error;

/// Errors that can occur during keyproof operations.
///
/// Failed proof checks are not errors; they are recorded as a
/// [`UserStatus`](crate::UserStatus).
#[derive(Debug, Error)]
pub enum KeyproofError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Statement or sigchain validation failed. The chain is unchanged.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Storage error, passed through unmodified.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The caller's deadline expired; nothing was written.
    #[error("operation cancelled")]
    Cancelled,

    #[error("no sigchain for kid: {0}")]
    KidNotFound(Kid),

    /// A save would drop or replace statements already persisted.
    #[error("sigchain for {0} does not extend the stored chain")]
    ChainRollback(Kid),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type for keyproof operations.
pub type Result<T> = std::result::Result<T, KeyproofError>;
