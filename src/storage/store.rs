use crate::document::filter::{Filter, Patch};
use crate::document::types::Document;
use crate::error::Result;
use crate::partition::types::ShardId;

use std::collections::BTreeSet;
use std::future::Future;

/// Per-shard document primitives. Implementations fail fast with
/// `ShardUnavailable` and never retry.
pub trait ShardStore: Send + Sync {
    fn shard(&self) -> ShardId;

    /// All documents of `collection` matching `filter`, in insertion order.
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Document>>> + Send;

    fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Applies `patch` to the first matching document; returns the number of
    /// documents actually changed.
    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn delete_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Removes every document of `collection`.
    fn clear(&self, collection: &str) -> impl Future<Output = Result<u64>> + Send;

    fn list_collections(&self) -> impl Future<Output = Result<BTreeSet<String>>> + Send;

    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}
