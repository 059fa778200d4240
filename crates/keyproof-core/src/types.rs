//! Strong identifier types.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Ed25519PublicKey;
use crate::error::CoreError;

/// Text prefix of an encoded [`Kid`].
pub const KID_PREFIX: &str = "kp";

/// A key identifier.
///
/// The KID is the Ed25519 public key itself, so two distinct keys can never
/// share an identifier. The text form is `kp` followed by 64 lowercase hex
/// digits; ordering follows the key bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Kid(pub [u8; 32]);

impl Kid {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The public key this KID identifies.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.0)
    }

    /// Parse the `kp<hex>` text form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex_part = s
            .strip_prefix(KID_PREFIX)
            .ok_or_else(|| CoreError::InvalidKid(s.to_string()))?;
        let bytes = hex::decode(hex_part).map_err(|_| CoreError::InvalidKid(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKid(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", KID_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kid({}{})", KID_PREFIX, &hex::encode(self.0)[..16])
    }
}

impl FromStr for Kid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Ed25519PublicKey> for Kid {
    fn from(key: Ed25519PublicKey) -> Self {
        Self(key.0)
    }
}

/// Content address of a statement: Blake3 over its canonical bytes.
///
/// Each statement after the first carries the hash of its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementHash(pub [u8; 32]);

impl StatementHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for StatementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatementHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for StatementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for StatementHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for StatementHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
