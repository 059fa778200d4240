//! DocumentStore trait: the abstract interface for document persistence.
//!
//! Documents are opaque byte blobs addressed by `(collection, key)`. Keys are
//! ordered bytewise within a collection, which makes prefix scans usable as
//! secondary indexes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// A stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub key: String,
    pub data: Vec<u8>,
}

/// One write in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        collection: String,
        key: String,
        data: Vec<u8>,
    },
    Delete {
        collection: String,
        key: String,
    },
}

/// A group of writes applied all-or-nothing.
///
/// Operations apply in insertion order, so a delete followed by a put of the
/// same key leaves the put.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, collection: &str, key: &str, data: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Put {
            collection: collection.to_string(),
            key: key.to_string(),
            data,
        });
        self
    }

    /// Queue an encoded document.
    pub fn put_encoded<T: Serialize>(
        &mut self,
        collection: &str,
        key: &str,
        value: &T,
    ) -> Result<&mut Self> {
        let data = encode_document(value)?;
        Ok(self.put(collection, key, data))
    }

    pub fn delete(&mut self, collection: &str, key: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            key: key.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// The DocumentStore trait: async interface for document persistence.
///
/// All methods are async so that blocking backends (SQLite) can move work off
/// the runtime with `spawn_blocking`.
///
/// Readers never observe a partially applied [`WriteBatch`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a document.
    async fn put(&self, collection: &str, key: &str, data: Vec<u8>) -> Result<()>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// Documents of a collection in key order, optionally only keys starting
    /// with `prefix`.
    async fn documents(&self, collection: &str, prefix: Option<&str>) -> Result<Vec<Document>>;

    /// Names of collections holding at least one document, sorted.
    async fn collections(&self) -> Result<Vec<String>>;

    /// Apply every write in `batch` atomically.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;
}

/// Encode a value as a CBOR document.
pub fn encode_document<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Decode a CBOR document.
pub fn decode_document<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Extension trait for typed documents.
pub trait StoreExt: DocumentStore {
    fn get_decoded<T: DeserializeOwned + Send>(
        &self,
        collection: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<T>>> + Send;

    fn put_encoded<T: Serialize + Sync>(
        &self,
        collection: &str,
        key: &str,
        value: &T,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Decoded documents in key order, paired with their keys.
    fn documents_decoded<T: DeserializeOwned + Send>(
        &self,
        collection: &str,
        prefix: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<(String, T)>>> + Send;
}

impl<S: DocumentStore + ?Sized> StoreExt for S {
    async fn get_decoded<T: DeserializeOwned + Send>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<T>> {
        match self.get(collection, key).await? {
            Some(data) => decode_document(&data).map(Some),
            None => Ok(None),
        }
    }

    async fn put_encoded<T: Serialize + Sync>(
        &self,
        collection: &str,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let data = encode_document(value)?;
        self.put(collection, key, data).await
    }

    async fn documents_decoded<T: DeserializeOwned + Send>(
        &self,
        collection: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<(String, T)>> {
        self.documents(collection, prefix)
            .await?
            .into_iter()
            .map(|doc| Ok((doc.key, decode_document(&doc.data)?)))
            .collect()
    }
}
