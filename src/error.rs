//! Error taxonomy shared by every subsystem.
//!
//! Each variant names the collection, shard, or record involved so that a
//! failure can be diagnosed from its message alone.

use crate::partition::types::ShardId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Debug, Error)]
pub enum ClusterError {
    /// The partition policy cannot place a record.
    #[error("cannot route {collection} record '{record_id}': {reason}")]
    UnroutableRecord {
        collection: String,
        record_id: String,
        reason: String,
    },

    /// A foreign key has no owner on any shard.
    #[error("{collection} record '{record_id}' references missing {target} '{key}'")]
    DanglingReference {
        collection: String,
        record_id: String,
        target: String,
        key: String,
    },

    /// A referenced record exists on more than one shard.
    #[error("{target} '{key}' exists on both shards; single-owner placement is violated")]
    SplitOwnership { target: String, key: String },

    #[error("shard {shard} is unavailable: {reason}")]
    ShardUnavailable { shard: ShardId, reason: String },

    #[error("aggregation source missing: {path}")]
    AggregationSourceMissing { path: String },

    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    /// Some shard groups were written before another shard failed.
    #[error(
        "partial insert into '{collection}': committed {committed:?}, shard {failed} failed: {source}"
    )]
    PartialInsert {
        collection: String,
        committed: Vec<(ShardId, u64)>,
        failed: ShardId,
        #[source]
        source: Box<ClusterError>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClusterError {
    pub fn unroutable(
        collection: impl Into<String>,
        record_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnroutableRecord {
            collection: collection.into(),
            record_id: record_id.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(shard: ShardId, reason: impl ToString) -> Self {
        Self::ShardUnavailable {
            shard,
            reason: reason.to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFilter(message.into())
    }
}
