//! Bulk Load Types
//!
//! The fixed partitioned file layout and the per-file load report.

use crate::partition::types::{CollectionKind, ShardId};

use serde::Serialize;

/// One partitioned file and the shard it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionedFile {
    pub file_name: &'static str,
    pub collection: CollectionKind,
    pub shard: ShardId,
}

/// Output layout of the partitioning step: region files for users and reads,
/// category files for articles.
pub const PARTITIONED_FILES: [PartitionedFile; 6] = [
    PartitionedFile {
        file_name: "user_beijing.json",
        collection: CollectionKind::User,
        shard: ShardId::A,
    },
    PartitionedFile {
        file_name: "article_science.json",
        collection: CollectionKind::Article,
        shard: ShardId::A,
    },
    PartitionedFile {
        file_name: "read_beijing.json",
        collection: CollectionKind::Read,
        shard: ShardId::A,
    },
    PartitionedFile {
        file_name: "user_hongkong.json",
        collection: CollectionKind::User,
        shard: ShardId::B,
    },
    PartitionedFile {
        file_name: "article_technology.json",
        collection: CollectionKind::Article,
        shard: ShardId::B,
    },
    PartitionedFile {
        file_name: "read_hongkong.json",
        collection: CollectionKind::Read,
        shard: ShardId::B,
    },
];

/// Records written from one file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileLoad {
    pub file_name: String,
    pub collection: CollectionKind,
    pub shard: ShardId,
    pub inserted: usize,
}
