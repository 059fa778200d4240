//! In-memory implementation of the DocumentStore trait.
//!
//! Same semantics as SQLite with no persistence. Every call takes the lock
//! once, so scans and batches never interleave.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::traits::{Document, DocumentStore, WriteBatch, WriteOp};

type Collections = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// In-memory store implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

fn apply_op(collections: &mut Collections, op: WriteOp) -> bool {
    match op {
        WriteOp::Put {
            collection,
            key,
            data,
        } => collections
            .entry(collection)
            .or_default()
            .insert(key, data)
            .is_some(),
        WriteOp::Delete { collection, key } => {
            let Some(docs) = collections.get_mut(&collection) else {
                return false;
            };
            let existed = docs.remove(&key).is_some();
            if docs.is_empty() {
                collections.remove(&collection);
            }
            existed
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, collection: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let mut inner = self.write()?;
        apply_op(
            &mut inner,
            WriteOp::Put {
                collection: collection.to_string(),
                key: key.to_string(),
                data,
            },
        );
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let inner = self.read()?;
        Ok(inner.get(collection).and_then(|docs| docs.get(key)).cloned())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(apply_op(
            &mut inner,
            WriteOp::Delete {
                collection: collection.to_string(),
                key: key.to_string(),
            },
        ))
    }

    async fn documents(&self, collection: &str, prefix: Option<&str>) -> Result<Vec<Document>> {
        let inner = self.read()?;
        let Some(docs) = inner.get(collection) else {
            return Ok(Vec::new());
        };
        let prefix = prefix.unwrap_or("");
        Ok(docs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| Document {
                key: key.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        let inner = self.read()?;
        Ok(inner.keys().cloned().collect())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.write()?;
        for op in batch.into_ops() {
            apply_op(&mut inner, op);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("kid", "a", b"one".to_vec()).await.unwrap();
        assert_eq!(store.get("kid", "a").await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get("kid", "b").await.unwrap(), None);
        assert_eq!(store.get("user", "a").await.unwrap(), None);

        assert!(store.delete("kid", "a").await.unwrap());
        assert!(!store.delete("kid", "a").await.unwrap());
        assert!(store.collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prefix_scan_ordered() {
        let store = MemoryStore::new();
        for key in ["b/2", "a/1", "b/1", "c", "b"] {
            store.put("user", key, key.as_bytes().to_vec()).await.unwrap();
        }
        let keys: Vec<String> = store
            .documents("user", Some("b/"))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["b/1", "b/2"]);

        let all = store.documents("user", None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].key, "a/1");
    }

    #[tokio::test]
    async fn test_batch_applies_in_order() {
        let store = MemoryStore::new();
        store.put("user", "x", vec![1]).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .delete("user", "x")
            .put("user", "x", vec![2])
            .put("kid", "k", vec![3]);
        store.apply(batch).await.unwrap();

        assert_eq!(store.get("user", "x").await.unwrap(), Some(vec![2]));
        assert_eq!(store.collections().await.unwrap(), vec!["kid", "user"]);
    }

    proptest! {
        #[test]
        fn prop_prefix_scan_matches_filter(
            keys in prop::collection::btree_set("[ab]{0,3}(/[0-9])?", 0..20),
            prefix in "[ab]{0,2}/?",
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let scanned: Vec<String> = rt.block_on(async {
                let store = MemoryStore::new();
                for key in &keys {
                    store.put("user", key, vec![]).await.unwrap();
                }
                store.documents("user", Some(prefix.as_str())).await.unwrap()
            })
            .into_iter()
            .map(|d| d.key)
            .collect();

            let expected: Vec<String> = keys
                .iter()
                .filter(|k| k.starts_with(prefix.as_str()))
                .cloned()
                .collect();
            prop_assert_eq!(scanned, expected);
        }
    }
}
