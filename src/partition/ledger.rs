//! Placement Ledger
//!
//! Records where each article was written. The article rule is probabilistic,
//! so re-deriving an article's shard from its category is not reliable.
//! Entries are written only after the shard accepted the article and are
//! treated as hints: reference resolution confirms a hit on the named shard
//! and forgets it when the article is gone.

use super::types::ShardId;

use dashmap::DashMap;

#[derive(Default)]
pub struct PlacementLedger {
    articles: DashMap<String, ShardId>,
}

impl PlacementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, aid: &str, shard: ShardId) {
        if let Some(previous) = self.articles.insert(aid.to_string(), shard)
            && previous != shard
        {
            tracing::warn!(
                "Article '{}' re-placed from shard {} to shard {}",
                aid,
                previous,
                shard
            );
        }
    }

    pub fn lookup(&self, aid: &str) -> Option<ShardId> {
        self.articles.get(aid).map(|entry| *entry.value())
    }

    pub fn forget(&self, aid: &str) {
        self.articles.remove(aid);
    }

    /// Drops every entry pointing at `shard`, after its Article collection was emptied.
    pub fn forget_shard(&self, shard: ShardId) {
        self.articles.retain(|_, placed| *placed != shard);
    }
}
