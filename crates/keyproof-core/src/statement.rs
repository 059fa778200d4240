//! Statement: one signed, sequenced entry in a sigchain.
//!
//! A statement is immutable once signed. A claim is withdrawn by appending a
//! revoke statement that names its seq; the original stays in the chain.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_bytes, signed_message};
use crate::crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::error::{ChainError, CoreError};
use crate::types::{Kid, StatementHash};
use crate::user::User;

/// The current statement schema version.
pub const STATEMENT_VERSION: u8 = 1;

/// The kind of statement, determining how the payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatementKind {
    /// Links the key to an account on a service. Payload is an encoded [`User`].
    UserLink = 0x0001,
    /// Revokes an earlier statement. Payload is empty.
    Revoke = 0x0002,
}

impl StatementKind {
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::UserLink),
            0x0002 => Some(Self::Revoke),
            _ => None,
        }
    }
}

/// Signed metadata of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementHeader {
    /// Schema version.
    pub version: u8,

    /// Key of the chain this statement belongs to.
    pub kid: Kid,

    /// Position in the chain (1-indexed).
    pub seq: u64,

    /// Hash of the statement at seq - 1. None iff seq = 1.
    pub prev: Option<StatementHash>,

    /// Signer-claimed creation time (Unix milliseconds).
    pub timestamp: i64,

    pub kind: StatementKind,

    /// The seq revoked by this statement. Set iff kind is Revoke.
    pub revoke: Option<u64>,

    /// Blake3 hash of the payload bytes.
    pub payload_hash: Blake3Hash,
}

/// A complete statement: header + payload + signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub header: StatementHeader,

    pub payload: Bytes,

    /// Ed25519 signature over (canonical_header || payload).
    pub signature: Ed25519Signature,
}

impl Statement {
    /// Blake3 hash of the canonical bytes; the next statement's `prev`.
    pub fn compute_hash(&self) -> StatementHash {
        StatementHash(Blake3Hash::hash(&canonical_bytes(self)).0)
    }

    pub fn kid(&self) -> &Kid {
        &self.header.kid
    }

    pub fn seq(&self) -> u64 {
        self.header.seq
    }

    pub fn kind(&self) -> StatementKind {
        self.header.kind
    }

    pub fn timestamp(&self) -> i64 {
        self.header.timestamp
    }

    pub fn prev(&self) -> Option<&StatementHash> {
        self.header.prev.as_ref()
    }

    pub fn is_revoke(&self) -> bool {
        self.header.kind == StatementKind::Revoke
    }

    /// The seq this statement revokes, if it is a revoke statement.
    pub fn revoked_seq(&self) -> Option<u64> {
        if self.is_revoke() {
            self.header.revoke
        } else {
            None
        }
    }

    /// The bytes covered by the signature.
    pub fn signed_bytes(&self) -> Vec<u8> {
        signed_message(&self.header, &self.payload)
    }

    /// Check the signature under `public_key`.
    pub fn verify(&self, public_key: &Ed25519PublicKey) -> bool {
        public_key
            .verify(&self.signed_bytes(), &self.signature)
            .is_ok()
    }

    /// Decode the user claim carried by a user-link statement.
    pub fn user(&self) -> Result<User, CoreError> {
        if self.header.kind != StatementKind::UserLink {
            return Err(CoreError::MalformedStatement(
                "not a user-link statement".into(),
            ));
        }
        User::from_bytes(&self.payload)
    }
}

/// Validate a statement on its own, without chain context.
///
/// Checks version, payload hash, kind-specific shape, that the header names
/// `root` and that the signature verifies under it.
pub fn validate_statement(
    statement: &Statement,
    root: &Ed25519PublicKey,
) -> Result<(), ChainError> {
    let header = &statement.header;

    if header.version != STATEMENT_VERSION {
        return Err(ChainError::UnsupportedVersion(header.version));
    }

    if Blake3Hash::hash(&statement.payload) != header.payload_hash {
        return Err(ChainError::PayloadHashMismatch);
    }

    if header.seq == 0 {
        return Err(ChainError::StructuralError("seq must be positive".into()));
    }
    if (header.seq == 1) != header.prev.is_none() {
        return Err(ChainError::StructuralError(
            "prev must be empty iff seq is 1".into(),
        ));
    }

    match header.kind {
        StatementKind::UserLink => {
            if header.revoke.is_some() {
                return Err(ChainError::StructuralError(
                    "user-link statement carries a revoke".into(),
                ));
            }
            let user = statement.user()?;
            if user.kid != header.kid || user.seq != header.seq {
                return Err(ChainError::InvalidUser(
                    "claim does not match its statement".into(),
                ));
            }
        }
        StatementKind::Revoke => {
            if header.revoke.is_none() || !statement.payload.is_empty() {
                return Err(ChainError::StructuralError(
                    "revoke statement must name a seq and have no payload".into(),
                ));
            }
        }
    }

    if header.kid != root.kid() {
        return Err(ChainError::KeyMismatch);
    }

    if !statement.verify(root) {
        return Err(ChainError::SignatureFailed);
    }

    Ok(())
}

/// Builder for creating statements.
pub struct StatementBuilder {
    kid: Kid,
    seq: u64,
    timestamp: i64,
    kind: StatementKind,
    prev: Option<StatementHash>,
    revoke: Option<u64>,
    payload: Bytes,
}

impl StatementBuilder {
    pub fn new(kid: Kid, seq: u64) -> Self {
        Self {
            kid,
            seq,
            timestamp: 0,
            kind: StatementKind::UserLink,
            prev: None,
            revoke: None,
            payload: Bytes::new(),
        }
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn kind(mut self, kind: StatementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn prev(mut self, prev: StatementHash) -> Self {
        self.prev = Some(prev);
        self
    }

    pub fn maybe_prev(mut self, prev: Option<StatementHash>) -> Self {
        self.prev = prev;
        self
    }

    pub fn revoke(mut self, seq: u64) -> Self {
        self.revoke = Some(seq);
        self
    }

    pub fn payload(mut self, p: impl Into<Bytes>) -> Self {
        self.payload = p.into();
        self
    }

    /// Build and sign the statement.
    pub fn sign(self, keypair: &Keypair) -> Statement {
        let header = StatementHeader {
            version: STATEMENT_VERSION,
            kid: self.kid,
            seq: self.seq,
            prev: self.prev,
            timestamp: self.timestamp,
            kind: self.kind,
            revoke: self.revoke,
            payload_hash: Blake3Hash::hash(&self.payload),
        };

        let signature = keypair.sign(&signed_message(&header, &self.payload));

        Statement {
            header,
            payload: self.payload,
            signature,
        }
    }
}
