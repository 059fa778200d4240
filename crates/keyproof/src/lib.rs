//! # Keyproof
//!
//! Signed, revocable identity claims with proof verification and search.
//!
//! ## Overview
//!
//! A key holder appends claims ("I own `alice` on github") to a sigchain
//! rooted at their key and publishes the signed claim on that service. The
//! [`UserStore`] fetches the published proofs, records whether each claim
//! still verifies, and keeps a search index over the verified ones.
//!
//! ## Key Concepts
//!
//! - **Sigchain**: append-only, hash-linked statements signed by one key.
//! - **Revoke**: a later statement that retires a claim. The claim stays in
//!   the chain for audit but leaves every active view.
//! - **UserResult**: a claim plus `status`, `timestamp` (last check) and
//!   `verified_at` (last successful verification).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyproof::{SearchRequest, UserStore, UserStoreConfig};
//! use keyproof::core::{Keypair, Service, SystemClock};
//! use keyproof::fetch::MemoryFetcher;
//! use keyproof::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("keyproof.db").unwrap();
//!     let users = UserStore::new(
//!         store,
//!         MemoryFetcher::new(),
//!         Arc::new(SystemClock),
//!         UserStoreConfig::default(),
//!     );
//!
//!     let keypair = Keypair::generate();
//!     let (_statement, proof) = users
//!         .create_user(&keypair, Service::Github, "alice", "https://gist.github.com/alice/1")
//!         .await
//!         .unwrap();
//!     // Publish proof.armor() at the URL, then:
//!     users.update(&keypair.kid()).await.unwrap();
//!     let found = users.search(&SearchRequest::new("ali")).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `keyproof::core` - Keys, statements, sigchains, claims
//! - `keyproof::store` - Document store abstraction and SQLite
//! - `keyproof::fetch` - Proof fetch capability

pub mod error;
pub mod records;
pub mod search;
pub mod sigchains;
pub mod user_store;

pub use keyproof_core as core;
pub use keyproof_fetch as fetch;
pub use keyproof_store as store;

pub use error::{KeyproofError, Result};
pub use records::{IndexEntry, KidRecord, UserResult, UserStatus};
pub use search::{Query, SearchRequest, SearchResult};
pub use sigchains::SigchainStore;
pub use user_store::{UserStore, UserStoreConfig};

pub use keyproof_core::{
    Clock, Keypair, Kid, MockClock, ProofMessage, Service, Sigchain, Statement, SystemClock, User,
};
