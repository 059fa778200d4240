//! Test fixtures and helpers.
//!
//! A [`Harness`] wires a [`UserStore`] to an in-memory store, a scripted
//! fetcher and a stepping clock, so scenario tests read like the sequence of
//! things a user does.

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use keyproof::{SearchRequest, SearchResult, UserStore, UserStoreConfig};
use keyproof_core::{Keypair, MockClock, Service, Statement};
use keyproof_fetch::MemoryFetcher;
use keyproof_store::MemoryStore;

/// Start of the harness clock, in milliseconds.
pub const START_MS: i64 = 1_234_567_890_001;

/// Deterministic keypair for test party `n`.
pub fn keypair(n: u8) -> Keypair {
    Keypair::from_seed(&[n; 32])
}

/// The proof URL a test publishes for `name` on `service`.
pub fn proof_url(service: Service, name: &str) -> Url {
    let url = service.url_template().replace("{name}", name).replace("{id}", "1");
    // Templates are fixed and names come from test code.
    Url::parse(&url).unwrap_or_else(|e| panic!("bad proof url {}: {}", url, e))
}

/// A UserStore over memory backends, with handles to the fetcher and clock.
pub struct Harness {
    pub users: UserStore<MemoryStore, Arc<MemoryFetcher>>,
    pub fetcher: Arc<MemoryFetcher>,
    pub clock: Arc<MockClock>,
}

impl Harness {
    /// A harness whose clock advances 1ms per reading.
    pub fn new() -> Self {
        Self::with_config(UserStoreConfig::default())
    }

    pub fn with_config(config: UserStoreConfig) -> Self {
        let fetcher = Arc::new(MemoryFetcher::new());
        let clock = Arc::new(MockClock::stepping(START_MS, 1));
        let users = UserStore::new(MemoryStore::new(), fetcher.clone(), clock.clone(), config);
        Self {
            users,
            fetcher,
            clock,
        }
    }

    /// Create a claim and publish its armored proof at the service URL.
    pub async fn save_user(&self, keypair: &Keypair, name: &str, service: Service) -> Statement {
        let url = proof_url(service, name);
        let (statement, proof) = self
            .users
            .create_user(keypair, service, name, url.as_str())
            .await
            .unwrap_or_else(|e| panic!("create_user {}@{}: {}", name, service, e));
        self.fetcher.set_body(&url, Bytes::from(proof.armor())).await;
        statement
    }

    /// Save a claim and run an update for its key.
    pub async fn save_and_update(&self, keypair: &Keypair, name: &str, service: Service) -> Statement {
        let statement = self.save_user(keypair, name, service).await;
        self.users
            .update(&keypair.kid())
            .await
            .unwrap_or_else(|e| panic!("update {}: {}", keypair.kid(), e));
        statement
    }

    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.search_request(&SearchRequest::new(query)).await
    }

    pub async fn search_request(&self, request: &SearchRequest) -> Vec<SearchResult> {
        self.users
            .search(request)
            .await
            .unwrap_or_else(|e| panic!("search {:?}: {}", request.query, e))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the results in a group, in order.
pub fn names(result: &SearchResult) -> Vec<&str> {
    result.results.iter().map(|r| r.user.name.as_str()).collect()
}
