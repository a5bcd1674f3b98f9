use crate::partition::types::ShardId;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How update/delete pick their shards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Shard A, then shard B only if A had no effect.
    #[default]
    FirstMatch,
    /// Every shard, unconditionally.
    Broadcast,
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-match" | "first_match" | "firstmatch" => Ok(WritePolicy::FirstMatch),
            "broadcast" => Ok(WritePolicy::Broadcast),
            other => Err(format!(
                "expected 'first-match' or 'broadcast', got '{other}'"
            )),
        }
    }
}

/// Per-shard outcome of one logical operation, in the order shards were contacted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardCounts {
    pub counts: Vec<(ShardId, u64)>,
}

impl ShardCounts {
    pub fn push(&mut self, shard: ShardId, count: u64) {
        self.counts.push((shard, count));
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn get(&self, shard: ShardId) -> u64 {
        self.counts
            .iter()
            .filter(|(id, _)| *id == shard)
            .map(|(_, n)| n)
            .sum()
    }

    /// Shards contacted, in order.
    pub fn contacted(&self) -> Vec<ShardId> {
        self.counts.iter().map(|(id, _)| *id).collect()
    }
}

impl fmt::Display for ShardCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(id, n)| format!("shard {id}: {n}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A Read stored somewhere other than its user's shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementViolation {
    pub read_id: String,
    pub uid: String,
    pub stored_on: ShardId,
    /// `None` when the user exists on no shard.
    pub user_shard: Option<ShardId>,
}

impl fmt::Display for PlacementViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_shard {
            Some(owner) => write!(
                f,
                "Read '{}' is on shard {} but user '{}' is on shard {}",
                self.read_id, self.stored_on, self.uid, owner
            ),
            None => write!(
                f,
                "Read '{}' on shard {} references missing user '{}'",
                self.read_id, self.stored_on, self.uid
            ),
        }
    }
}
