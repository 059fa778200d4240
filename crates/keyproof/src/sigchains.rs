//! Persisted sigchains.
//!
//! Each chain is one document in the `sigchain` collection, keyed by the KID
//! text form, holding the canonical bytes of every statement.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use keyproof_core::{canonical_bytes, decode_statement, Ed25519PublicKey, Kid, Sigchain};
use keyproof_store::{DocumentStore, StoreExt, WriteBatch};

use crate::error::{KeyproofError, Result};

pub const SIGCHAIN_COLLECTION: &str = "sigchain";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSigchain {
    root: Ed25519PublicKey,
    statements: Vec<Bytes>,
}

/// Loads and saves sigchains in a [`DocumentStore`].
pub struct SigchainStore<S: DocumentStore> {
    store: Arc<S>,
    validate_on_load: bool,
}

impl<S: DocumentStore> SigchainStore<S> {
    pub fn new(store: Arc<S>, validate_on_load: bool) -> Self {
        Self {
            store,
            validate_on_load,
        }
    }

    /// Load the chain for `kid`, or None if nothing was saved.
    ///
    /// With validation on, every statement is replayed through
    /// [`Sigchain::add`], so a tampered document fails to load.
    pub async fn sigchain(&self, kid: &Kid) -> Result<Option<Sigchain>> {
        let Some(stored) = self
            .store
            .get_decoded::<StoredSigchain>(SIGCHAIN_COLLECTION, &kid.to_string())
            .await?
        else {
            return Ok(None);
        };

        if stored.root.kid() != *kid {
            return Err(KeyproofError::InvalidData(format!(
                "sigchain document for {} has root {}",
                kid,
                stored.root.kid()
            )));
        }

        let statements = stored
            .statements
            .iter()
            .map(|bytes| decode_statement(bytes))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let chain = if self.validate_on_load {
            Sigchain::from_statements(stored.root, statements).map_err(|e| {
                warn!(kid = %kid, error = %e, "stored sigchain failed validation");
                e
            })?
        } else {
            Sigchain::from_trusted(stored.root, statements)
        };
        debug!(kid = %kid, last_seq = chain.last_seq(), "loaded sigchain");
        Ok(Some(chain))
    }

    /// Save `chain`, which must extend whatever is already stored.
    pub async fn save_sigchain(&self, chain: &Sigchain) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.stage_sigchain(chain, &mut batch).await?;
        self.store.apply(batch).await?;

        debug!(kid = %chain.kid(), last_seq = chain.last_seq(), "saved sigchain");
        Ok(())
    }

    /// Add the write for `chain` to `batch`, so it can commit together with
    /// other documents.
    pub async fn stage_sigchain(&self, chain: &Sigchain, batch: &mut WriteBatch) -> Result<()> {
        let kid = chain.kid();
        let key = kid.to_string();

        if let Some(stored) = self
            .store
            .get_decoded::<StoredSigchain>(SIGCHAIN_COLLECTION, &key)
            .await?
        {
            let extends = stored.statements.len() <= chain.statements().len()
                && stored
                    .statements
                    .iter()
                    .zip(chain.statements())
                    .all(|(bytes, st)| bytes.as_ref() == canonical_bytes(st).as_slice());
            if !extends {
                return Err(KeyproofError::ChainRollback(kid));
            }
        }

        let doc = StoredSigchain {
            root: *chain.root(),
            statements: chain
                .statements()
                .iter()
                .map(|st| Bytes::from(canonical_bytes(st)))
                .collect(),
        };
        batch.put_encoded(SIGCHAIN_COLLECTION, &key, &doc)?;
        Ok(())
    }

    /// KIDs with a saved chain, in key order.
    pub async fn kids(&self) -> Result<Vec<Kid>> {
        self.store
            .documents(SIGCHAIN_COLLECTION, None)
            .await?
            .into_iter()
            .map(|doc| Kid::parse(&doc.key).map_err(KeyproofError::from))
            .collect()
    }
}
