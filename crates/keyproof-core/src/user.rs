//! User claims: "the holder of this key owns this account".

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::CoreError;
use crate::service::Service;
use crate::types::Kid;

/// Longest accepted account name.
pub const MAX_NAME_LEN: usize = 39;

/// A claim linking a key to an account, carried as a user-link payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub kid: Kid,
    pub service: Service,
    pub name: String,
    pub url: Url,
    /// Seq of the statement asserting this claim.
    pub seq: u64,
}

impl User {
    pub fn new(
        kid: Kid,
        service: Service,
        name: &str,
        url: &str,
        seq: u64,
    ) -> Result<Self, CoreError> {
        check_name(name)?;
        if seq == 0 {
            return Err(CoreError::InvalidUser("seq must be positive".into()));
        }
        let url = Url::parse(url).map_err(|e| CoreError::InvalidUser(format!("{}: {}", url, e)))?;
        service.check_url(name, &url)?;

        Ok(Self {
            kid,
            service,
            name: name.to_string(),
            url,
            seq,
        })
    }

    /// The `name@service` form used in queries.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.service)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode and re-check a claim.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let user: User =
            ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        check_name(&user.name)?;
        user.service.check_url(&user.name, &user.url)?;
        if user.seq == 0 {
            return Err(CoreError::InvalidUser("seq must be positive".into()));
        }
        Ok(user)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.service)
    }
}

fn check_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(CoreError::InvalidUser(format!("invalid name length: {:?}", name)));
    }
    let valid = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if !valid {
        return Err(CoreError::InvalidUser(format!("name not normalized: {:?}", name)));
    }
    Ok(())
}
