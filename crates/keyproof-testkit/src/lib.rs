//! # Keyproof Testkit
//!
//! Testing utilities for keyproof.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a [`Harness`] over memory backends with a stepping clock
//! - **Generators**: Proptest strategies for names, claims and valid chains
//!
//! Scenario tests for verification, search and expiry live in `tests/`.
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use keyproof_testkit::fixtures::{keypair, Harness};
//! use keyproof::core::Service;
//!
//! async fn example() {
//!     let harness = Harness::new();
//!     let alice = keypair(1);
//!     harness.save_and_update(&alice, "alice", Service::Github).await;
//!     assert_eq!(harness.search("alic").await.len(), 1);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keyproof_testkit::generators::statements;
//!
//! proptest! {
//!     #[test]
//!     fn chains_replay((keypair, sts) in statements(8)) {
//!         prop_assert!(Sigchain::from_statements(keypair.public_key(), sts).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{keypair, names, proof_url, Harness, START_MS};
pub use generators::{build_chain, sigchain, statements, ChainOp};
