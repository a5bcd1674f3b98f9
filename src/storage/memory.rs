use super::store::ShardStore;
use crate::document::filter::{Filter, Patch};
use crate::document::types::{Document, FIELD_OBJECT_ID};
use crate::error::{ClusterError, Result};
use crate::partition::types::ShardId;

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// In-process document store for one shard.
///
/// Structure: `collection name -> documents in insertion order`. Each
/// collection entry is locked independently, so concurrent router calls on
/// different collections never contend.
pub struct MemoryStore {
    shard: ShardId,
    collections: DashMap<String, Vec<Document>>,
    online: AtomicBool,
}

impl MemoryStore {
    pub fn new(shard: ShardId) -> Self {
        Self {
            shard,
            collections: DashMap::new(),
            online: AtomicBool::new(true),
        }
    }

    /// Simulates an outage: while offline every call fails with `ShardUnavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn check_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClusterError::unavailable(self.shard, "shard is offline"))
        }
    }
}

impl ShardStore for MemoryStore {
    fn shard(&self) -> ShardId {
        self.shard
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.check_online()?;
        let found = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        Ok(found)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        self.check_online()?;
        let count = documents.len();
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        for mut doc in documents {
            if !doc.contains_key(FIELD_OBJECT_ID) {
                doc.insert(
                    FIELD_OBJECT_ID.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
            }
            entry.push(doc);
        }
        tracing::debug!(
            "Shard {}: inserted {} document(s) into '{}'",
            self.shard,
            count,
            collection
        );
        Ok(count)
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64> {
        self.check_online()?;
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(doc) => Ok(u64::from(patch.apply(doc))),
            None => Ok(0),
        }
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.check_online()?;
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        self.check_online()?;
        let removed = self
            .collections
            .get_mut(collection)
            .map(|mut docs| std::mem::take(&mut *docs).len() as u64)
            .unwrap_or(0);
        Ok(removed)
    }

    async fn list_collections(&self) -> Result<BTreeSet<String>> {
        self.check_online()?;
        Ok(self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}
