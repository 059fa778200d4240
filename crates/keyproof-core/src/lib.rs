//! # Keyproof Core
//!
//! Pure primitives for keyproof: keys, statements, sigchains and user claims.
//!
//! This crate contains no I/O, no storage, no networking. Time comes from an
//! injected [`Clock`].
//!
//! ## Key Types
//!
//! - [`Kid`] - Key identifier, the Ed25519 public key
//! - [`Statement`] - One signed, sequenced chain entry (user-link or revoke)
//! - [`Sigchain`] - Append-only, hash-linked statements rooted at one key
//! - [`User`] - A claim that the key holder owns an account on a [`Service`]
//! - [`ProofMessage`] - The signed statement as published on a service
//!
//! ## Canonicalization
//!
//! Statement headers are encoded as deterministic CBOR. See [`canonical`].

pub mod canonical;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod proof;
pub mod service;
pub mod sigchain;
pub mod statement;
pub mod types;
pub mod user;

pub use canonical::{canonical_bytes, canonical_header_bytes, decode_statement};
pub use clock::{Clock, MockClock, SystemClock};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{ChainError, CoreError};
pub use proof::ProofMessage;
pub use service::{ContentRule, Service};
pub use sigchain::Sigchain;
pub use statement::{
    validate_statement, Statement, StatementBuilder, StatementHeader, StatementKind,
    STATEMENT_VERSION,
};
pub use types::{Kid, StatementHash};
pub use user::User;
