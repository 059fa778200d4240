//! # Keyproof Store
//!
//! Document storage for keyproof. Provides a trait-based interface over
//! ordered `(collection, key)` documents with SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`DocumentStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`WriteBatch`] - Writes applied atomically
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyproof_store::{DocumentStore, SqliteStore, StoreExt, WriteBatch};
//!
//! async fn example() -> keyproof_store::Result<()> {
//!     let store = SqliteStore::open("keyproof.db")?;
//!
//!     store.put_encoded("kid", "kp00", &42u64).await?;
//!     let value: Option<u64> = store.get_decoded("kid", "kp00").await?;
//!
//!     let mut batch = WriteBatch::new();
//!     batch.delete("kid", "kp00").put("user", "kp00/1", vec![1, 2, 3]);
//!     store.apply(batch).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    decode_document, encode_document, Document, DocumentStore, StoreExt, WriteBatch, WriteOp,
};
