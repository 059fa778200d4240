//! Persisted verification records.
//!
//! Two collections hold the state written by
//! [`UserStore::update`](crate::UserStore::update):
//!
//! - `kid`: one [`KidRecord`] per key, the raw result of the last update,
//!   including failed checks.
//! - `user`: one [`IndexEntry`] per search-visible identity, keyed
//!   `<kid>/<seq>` so a key's entries share a prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

use keyproof_core::{Blake3Hash, Kid, User};

pub const KID_COLLECTION: &str = "kid";
pub const USER_COLLECTION: &str = "user";

/// Outcome of the last proof check for a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    /// The hosted proof carries the statement's payload and signature.
    Ok,
    /// The proof is definitively gone.
    NotFound,
    /// Transient failure; `code` is the HTTP status or 0 for network errors.
    ConnFailure { code: u16 },
    /// The proof was fetched but does not carry the expected message.
    Malformed,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Ok => f.write_str("ok"),
            UserStatus::NotFound => f.write_str("not-found"),
            UserStatus::ConnFailure { code } => write!(f, "conn-failure({})", code),
            UserStatus::Malformed => f.write_str("malformed"),
        }
    }
}

/// A claim plus its verification state.
///
/// `timestamp` is the last check attempt. `verified_at` is the last time the
/// proof was verified against new content; it never moves on a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResult {
    pub user: User,
    pub status: UserStatus,
    pub timestamp: i64,
    pub verified_at: Option<i64>,
    /// Blake3 of the proof content last verified. Cleared when the proof is
    /// retracted.
    pub proof_digest: Option<Blake3Hash>,
}

impl UserResult {
    /// Whether this result belongs in the search index.
    ///
    /// A transient failure keeps a claim searchable only while it still
    /// carries the digest of a verified proof. NotFound and Malformed clear
    /// the digest, so a retracted claim stays out until it verifies again.
    pub fn is_indexed(&self) -> bool {
        match self.status {
            UserStatus::Ok => true,
            UserStatus::ConnFailure { .. } => self.proof_digest.is_some(),
            UserStatus::NotFound | UserStatus::Malformed => false,
        }
    }

    /// Checked before but never verified.
    pub fn never_verified(&self) -> bool {
        self.verified_at.is_none()
    }
}

/// Latest update state for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KidRecord {
    pub kid: Kid,
    /// Time of the last update.
    pub timestamp: i64,
    /// When the key first had a search-visible identity. Never reset.
    pub first_indexed_at: Option<i64>,
    /// One result per active claim, ascending seq.
    pub results: Vec<UserResult>,
}

impl KidRecord {
    pub fn result_for(&self, seq: u64) -> Option<&UserResult> {
        self.results.iter().find(|r| r.user.seq == seq)
    }
}

/// A search-visible identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub result: UserResult,
    /// The key's `first_indexed_at`, copied for ordering.
    pub kid_indexed_at: i64,
}

/// Document key of an index entry. Zero-padded so keys sort by seq.
pub fn index_key(kid: &Kid, seq: u64) -> String {
    format!("{}/{:020}", kid, seq)
}

/// Prefix shared by every index entry of `kid`.
pub fn index_prefix(kid: &Kid) -> String {
    format!("{}/", kid)
}
