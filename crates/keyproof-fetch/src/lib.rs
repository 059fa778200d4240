//! # Keyproof Fetch
//!
//! The fetch capability used to retrieve hosted proofs.
//!
//! ## Classification
//!
//! Every failure is one of:
//!
//! - **absent** (404, 410): the proof is gone; the claim is retracted from search
//! - **transient** (other statuses, network errors): retry later; prior
//!   verification is kept
//! - **cancelled**: the caller's deadline expired
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyproof_fetch::{Fetcher, MemoryFetcher};
//! use url::Url;
//!
//! async fn example() {
//!     let fetcher = MemoryFetcher::new();
//!     let url = Url::parse("https://gist.github.com/alice/1").unwrap();
//!     fetcher.set_body(&url, "BEGIN KEYPROOF MESSAGE. ...").await;
//!     let body = fetcher.fetch(&url).await;
//! }
//! ```

pub mod error;
pub mod fetcher;

pub use error::{FetchError, Result};
pub use fetcher::{memory::MemoryFetcher, memory::MockResponse, Fetcher};
