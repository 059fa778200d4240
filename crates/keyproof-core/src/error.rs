//! Error types for keyproof core.

use thiserror::Error;

use crate::types::StatementHash;

/// Errors from cryptographic and encoding operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid kid: {0}")]
    InvalidKid(String),

    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("unsupported statement version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed statement: {0}")]
    MalformedStatement(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Errors from statement generation and sigchain validation.
///
/// A chain operation that fails with any of these leaves the chain unmodified.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("seq mismatch: expected {expected}, got {got}")]
    SeqMismatch { expected: u64, got: u64 },

    #[error("user seq mismatch")]
    UserSeqMismatch,

    #[error("prev hash mismatch: expected {expected:?}, got {got:?}")]
    PrevMismatch {
        expected: Option<StatementHash>,
        got: Option<StatementHash>,
    },

    #[error("statement signed for a different key")]
    KeyMismatch,

    #[error("signature verification failed")]
    SignatureFailed,

    #[error("payload hash does not match header")]
    PayloadHashMismatch,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid revoke of seq {seq}: {reason}")]
    InvalidRevoke { seq: u64, reason: &'static str },

    #[error("seq {0} is already revoked")]
    AlreadyRevoked(u64),

    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ChainError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => ChainError::SignatureFailed,
            CoreError::UnsupportedVersion(v) => ChainError::UnsupportedVersion(v),
            CoreError::InvalidUser(msg) => ChainError::InvalidUser(msg),
            CoreError::InvalidKid(msg)
            | CoreError::MalformedStatement(msg)
            | CoreError::EncodingError(msg)
            | CoreError::DecodingError(msg) => ChainError::StructuralError(msg),
        }
    }
}
