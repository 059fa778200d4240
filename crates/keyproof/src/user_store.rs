//! The UserStore: claim creation, proof verification and search.
//!
//! `update` reconciles every active claim of a key with its hosted proof and
//! replaces the key's records in one batch. Search reads the derived index
//! entries, so a claim is only visible once an update has verified it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use keyproof_core::{
    Blake3Hash, Clock, Keypair, Kid, ProofMessage, Service, Sigchain, Statement, User,
};
use keyproof_fetch::{FetchError, Fetcher};
use keyproof_store::{DocumentStore, StoreExt, WriteBatch};

use crate::error::{KeyproofError, Result};
use crate::records::{
    index_key, index_prefix, IndexEntry, KidRecord, UserResult, UserStatus, KID_COLLECTION,
    USER_COLLECTION,
};
use crate::search::{self, Query, SearchRequest, SearchResult};
use crate::sigchains::SigchainStore;

/// Configuration for the UserStore.
#[derive(Debug, Clone)]
pub struct UserStoreConfig {
    /// Group limit for searches that do not set one.
    pub default_search_limit: usize,
    /// Replay stored sigchains through validation when loading them.
    pub validate_on_load: bool,
}

impl Default for UserStoreConfig {
    fn default() -> Self {
        Self {
            default_search_limit: 100,
            validate_on_load: true,
        }
    }
}

/// Claims, their verification state and the search index over them.
///
/// Storage, fetching and time are injected. Writes for one KID must be
/// serialized by the caller; updates for different KIDs may run in parallel.
pub struct UserStore<S: DocumentStore, F: Fetcher> {
    store: Arc<S>,
    sigchains: SigchainStore<S>,
    fetcher: F,
    clock: Arc<dyn Clock>,
    config: UserStoreConfig,
}

impl<S: DocumentStore, F: Fetcher> UserStore<S, F> {
    pub fn new(store: S, fetcher: F, clock: Arc<dyn Clock>, config: UserStoreConfig) -> Self {
        let store = Arc::new(store);
        Self {
            sigchains: SigchainStore::new(store.clone(), config.validate_on_load),
            store,
            fetcher,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sigchains(&self) -> &SigchainStore<S> {
        &self.sigchains
    }

    pub fn config(&self) -> &UserStoreConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Claims
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a claim for `name@service` to the keypair's sigchain.
    ///
    /// Returns the new statement and the proof message the holder must
    /// publish at `url`. The claim is not searchable until an update has
    /// verified it.
    pub async fn create_user(
        &self,
        keypair: &Keypair,
        service: Service,
        name: &str,
        url: &str,
    ) -> Result<(Statement, ProofMessage)> {
        let kid = keypair.kid();
        let mut chain = self
            .sigchains
            .sigchain(&kid)
            .await?
            .unwrap_or_else(|| Sigchain::new(keypair.public_key()));

        let user = User::new(kid, service, name, url, chain.last_seq() + 1)?;
        let statement = chain.generate_user(&user, keypair, self.clock.as_ref())?;
        chain.add(statement.clone())?;
        self.sigchains.save_sigchain(&chain).await?;

        info!(kid = %kid, seq = user.seq, user = %user, "created user claim");
        let proof = ProofMessage::from_statement(&statement);
        Ok((statement, proof))
    }

    /// Revoke the claim at `seq`.
    ///
    /// The claim leaves the search index and the key's record in the same
    /// batch that saves the revoke statement.
    pub async fn revoke(&self, keypair: &Keypair, seq: u64) -> Result<Statement> {
        let kid = keypair.kid();
        let mut chain = self
            .sigchains
            .sigchain(&kid)
            .await?
            .ok_or(KeyproofError::KidNotFound(kid))?;
        let statement = chain.revoke(seq, keypair, self.clock.as_ref())?.clone();

        let mut batch = WriteBatch::new();
        self.sigchains.stage_sigchain(&chain, &mut batch).await?;
        if let Some(mut record) = self.kid_record(&kid).await? {
            record.results.retain(|r| r.user.seq != seq);
            batch.put_encoded(KID_COLLECTION, &kid.to_string(), &record)?;
        }
        batch.delete(USER_COLLECTION, &index_key(&kid, seq));
        self.store.apply(batch).await?;

        info!(kid = %kid, seq, revoke_seq = statement.seq(), "revoked user claim");
        Ok(statement)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Check every active claim of `kid` against its hosted proof.
    ///
    /// Returns the result for the most recent active claim, or None when the
    /// key has no active claims. Proof failures are recorded in the results,
    /// not returned as errors.
    pub async fn update(&self, kid: &Kid) -> Result<Option<UserResult>> {
        self.update_until(kid, None).await
    }

    /// Like [`update`](Self::update), but gives up with
    /// [`KeyproofError::Cancelled`] once `timeout` has passed. Nothing is
    /// written on cancellation.
    pub async fn update_with_deadline(
        &self,
        kid: &Kid,
        timeout: Duration,
    ) -> Result<Option<UserResult>> {
        self.update_until(kid, Some(Instant::now() + timeout)).await
    }

    async fn update_until(&self, kid: &Kid, deadline: Option<Instant>) -> Result<Option<UserResult>> {
        let chain = self
            .sigchains
            .sigchain(kid)
            .await?
            .ok_or(KeyproofError::KidNotFound(*kid))?;
        let now = self.clock.now_ms();
        let previous = self.kid_record(kid).await?;

        let active: Vec<&Statement> = chain.active_statements().collect();
        let mut results = Vec::with_capacity(active.len());
        for statement in active.into_iter().rev() {
            let user = statement.user()?;
            let prior = previous.as_ref().and_then(|r| r.result_for(user.seq));
            let result = self.check(statement, user, prior, now, deadline).await?;
            results.push(result);
        }
        results.reverse();

        let first_indexed_at = previous
            .as_ref()
            .and_then(|r| r.first_indexed_at)
            .or_else(|| results.iter().any(UserResult::is_indexed).then_some(now));

        let mut batch = WriteBatch::new();
        let indexed: Vec<IndexEntry> = match first_indexed_at {
            Some(kid_indexed_at) => results
                .iter()
                .filter(|r| r.is_indexed())
                .map(|r| IndexEntry {
                    result: r.clone(),
                    kid_indexed_at,
                })
                .collect(),
            None => Vec::new(),
        };
        let keep: BTreeSet<String> = indexed
            .iter()
            .map(|e| index_key(kid, e.result.user.seq))
            .collect();

        for doc in self
            .store
            .documents(USER_COLLECTION, Some(index_prefix(kid).as_str()))
            .await?
        {
            if !keep.contains(&doc.key) {
                debug!(kid = %kid, key = %doc.key, "removing index entry");
                batch.delete(USER_COLLECTION, &doc.key);
            }
        }
        for entry in &indexed {
            batch.put_encoded(
                USER_COLLECTION,
                &index_key(kid, entry.result.user.seq),
                entry,
            )?;
        }

        let latest = results.last().cloned();
        let record = KidRecord {
            kid: *kid,
            timestamp: now,
            first_indexed_at,
            results,
        };
        batch.put_encoded(KID_COLLECTION, &kid.to_string(), &record)?;
        self.store.apply(batch).await?;

        debug!(
            kid = %kid,
            checked = record.results.len(),
            indexed = indexed.len(),
            "updated kid record"
        );
        Ok(latest)
    }

    async fn check(
        &self,
        statement: &Statement,
        user: User,
        prior: Option<&UserResult>,
        now: i64,
        deadline: Option<Instant>,
    ) -> Result<UserResult> {
        let fetched = match deadline {
            Some(at) => tokio::time::timeout_at(at, self.fetcher.fetch(&user.url))
                .await
                .map_err(|_| {
                    warn!(kid = %user.kid, seq = user.seq, "proof fetch deadline expired");
                    KeyproofError::Cancelled
                })?,
            None => self.fetcher.fetch(&user.url).await,
        };

        let prior_verified_at = prior.and_then(|p| p.verified_at);
        let prior_digest = prior.and_then(|p| p.proof_digest);

        let (status, verified_at, proof_digest) = match fetched {
            Ok(body) => {
                let content = String::from_utf8_lossy(&body);
                if ProofMessage::proves(&content, user.service.content_rule(), statement) {
                    let digest = Blake3Hash::hash(&body);
                    let verified_at = match (prior_digest, prior_verified_at) {
                        (Some(d), Some(at)) if d == digest => at,
                        _ => now,
                    };
                    (UserStatus::Ok, Some(verified_at), Some(digest))
                } else {
                    (UserStatus::Malformed, prior_verified_at, None)
                }
            }
            Err(FetchError::Cancelled) => return Err(KeyproofError::Cancelled),
            Err(e) if e.is_absent() => (UserStatus::NotFound, prior_verified_at, None),
            Err(e) if e.is_transient() => (
                UserStatus::ConnFailure { code: e.code() },
                prior_verified_at,
                prior_digest,
            ),
            Err(_) => (UserStatus::Malformed, prior_verified_at, None),
        };

        match status {
            UserStatus::Ok => {
                info!(kid = %user.kid, seq = user.seq, user = %user, %status, "proof verified")
            }
            _ => warn!(kid = %user.kid, seq = user.seq, user = %user, %status, "proof check failed"),
        }

        Ok(UserResult {
            user,
            status,
            timestamp: now,
            verified_at,
            proof_digest,
        })
    }

    /// KIDs whose last update is at least `max_age` old, oldest first.
    pub async fn expired(&self, max_age: Duration) -> Result<Vec<Kid>> {
        let max_age = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let cutoff = self.clock.now_ms().saturating_sub(max_age);

        let mut stale: Vec<(i64, Kid)> = self
            .store
            .documents_decoded::<KidRecord>(KID_COLLECTION, None)
            .await?
            .into_iter()
            .filter(|(_, record)| record.timestamp <= cutoff)
            .map(|(_, record)| (record.timestamp, record.kid))
            .collect();
        stale.sort();
        Ok(stale.into_iter().map(|(_, kid)| kid).collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The raw record of the last update, including failed checks.
    pub async fn kid_record(&self, kid: &Kid) -> Result<Option<KidRecord>> {
        Ok(self
            .store
            .get_decoded::<KidRecord>(KID_COLLECTION, &kid.to_string())
            .await?)
    }

    /// The search-visible results for `kid`, ascending seq.
    pub async fn indexed(&self, kid: &Kid) -> Result<Vec<UserResult>> {
        Ok(self
            .store
            .documents_decoded::<IndexEntry>(USER_COLLECTION, Some(index_prefix(kid).as_str()))
            .await?
            .into_iter()
            .map(|(_, entry)| entry.result)
            .collect())
    }

    /// Search verified identities. No matches is an empty result.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let limit = request.limit.unwrap_or(self.config.default_search_limit);
        let query = Query::parse(&request.query);
        let entries = self
            .store
            .documents_decoded::<IndexEntry>(USER_COLLECTION, None)
            .await?;

        let results = search::rank(entries.into_iter().map(|(_, e)| e), &query, limit);
        debug!(query = %request.query, limit, groups = results.len(), "search");
        Ok(results)
    }
}
