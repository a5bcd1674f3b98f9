//! Shard Registry
//!
//! Owns exactly one store handle per shard and hands them out by id. The
//! registry performs no cross-shard behaviour of its own.
//!
//! Lifecycle: `connect` (or `in_memory`) at process start, `verify` to fail
//! fast on an unreachable shard, `close` on clean exit or signal.

use super::memory::MemoryStore;
use super::remote::RemoteStore;
use super::store::ShardStore;
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::partition::types::ShardId;

pub struct ShardRegistry<S> {
    shard_a: S,
    shard_b: S,
}

impl<S: ShardStore> ShardRegistry<S> {
    pub fn new(shard_a: S, shard_b: S) -> Self {
        Self { shard_a, shard_b }
    }

    pub fn shard(&self, id: ShardId) -> &S {
        match id {
            ShardId::A => &self.shard_a,
            ShardId::B => &self.shard_b,
        }
    }

    /// Every shard handle, in merge order.
    pub fn shards(&self) -> [(ShardId, &S); 2] {
        [(ShardId::A, &self.shard_a), (ShardId::B, &self.shard_b)]
    }

    /// Pings every shard; the first unreachable one aborts startup.
    pub async fn verify(&self) -> Result<()> {
        for (id, store) in self.shards() {
            store.ping().await?;
            tracing::info!("Shard {} is reachable", id);
        }
        Ok(())
    }

    pub fn close(self) {
        tracing::info!("Shard registry closed");
    }
}

impl ShardRegistry<RemoteStore> {
    /// Opens both remote shards and verifies connectivity.
    pub async fn connect(config: &ClusterConfig) -> Result<Self> {
        let registry = Self::new(
            RemoteStore::new(ShardId::A, &config.shard_a, config.request_timeout),
            RemoteStore::new(ShardId::B, &config.shard_b, config.request_timeout),
        );
        for (id, store) in registry.shards() {
            tracing::info!("Connecting to shard {} at {}", id, store.base_url());
        }
        registry.verify().await?;
        Ok(registry)
    }
}

impl ShardRegistry<MemoryStore> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(ShardId::A), MemoryStore::new(ShardId::B))
    }
}
