//! SQLite implementation of the DocumentStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Document, DocumentStore, WriteBatch, WriteOp};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations run on the blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sqlite store");
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn apply_op(conn: &Connection, op: &WriteOp) -> Result<usize> {
    let changed = match op {
        WriteOp::Put {
            collection,
            key,
            data,
        } => conn.execute(
            "INSERT INTO documents (collection, key, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, key) DO UPDATE SET data = excluded.data",
            params![collection, key, data],
        )?,
        WriteOp::Delete { collection, key } => conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection, key],
        )?,
    };
    Ok(changed)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn put(&self, collection: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let op = WriteOp::Put {
            collection: collection.to_string(),
            key: key.to_string(),
            data,
        };
        self.blocking(move |conn| apply_op(conn, &op).map(|_| ()))
            .await
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let collection = collection.to_string();
        let key = key.to_string();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND key = ?2",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let op = WriteOp::Delete {
            collection: collection.to_string(),
            key: key.to_string(),
        };
        self.blocking(move |conn| apply_op(conn, &op).map(|n| n > 0))
            .await
    }

    async fn documents(&self, collection: &str, prefix: Option<&str>) -> Result<Vec<Document>> {
        let collection = collection.to_string();
        let prefix = prefix.unwrap_or("").to_string();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT key, data FROM documents
                 WHERE collection = ?1 AND substr(key, 1, length(?2)) = ?2
                 ORDER BY key",
            )?;
            let docs = stmt
                .query_map(params![collection, prefix], |row| {
                    Ok(Document {
                        key: row.get(0)?,
                        data: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(docs)
        })
        .await
    }

    async fn collections(&self) -> Result<Vec<String>> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare_cached("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .await
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            for op in batch.ops() {
                apply_op(&tx, op)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
