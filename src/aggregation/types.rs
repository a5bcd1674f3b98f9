use crate::document::types::{Document, into_document};
use crate::error::Result;
use crate::router::types::ShardCounts;

use serde::{Deserialize, Serialize};

pub const TOP_K: usize = 5;

pub const WEIGHT_READ: u64 = 1;
pub const WEIGHT_COMMENT: u64 = 3;
pub const WEIGHT_AGREE: u64 = 2;
pub const WEIGHT_SHARE: u64 = 4;

/// Engagement counters for one article.
///
/// Each `*UidList` holds distinct user ids; the matching `*Num` counts events,
/// so a user reading twice adds 2 to `readNum` and 1 entry to `readUidList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeRead {
    pub aid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub read_num: u64,
    #[serde(default)]
    pub read_uid_list: Vec<String>,
    pub comment_num: u64,
    #[serde(default)]
    pub comment_uid_list: Vec<String>,
    pub agree_num: u64,
    #[serde(default)]
    pub agree_uid_list: Vec<String>,
    pub share_num: u64,
    #[serde(default)]
    pub share_uid_list: Vec<String>,
    /// Latest contributing event, epoch seconds.
    pub timestamp: i64,
}

impl BeRead {
    pub fn empty(aid: String, category: Option<String>, timestamp: i64) -> Self {
        Self {
            aid,
            category,
            read_num: 0,
            read_uid_list: Vec::new(),
            comment_num: 0,
            comment_uid_list: Vec::new(),
            agree_num: 0,
            agree_uid_list: Vec::new(),
            share_num: 0,
            share_uid_list: Vec::new(),
            timestamp,
        }
    }

    pub fn score(&self) -> u64 {
        self.read_num * WEIGHT_READ
            + self.comment_num * WEIGHT_COMMENT
            + self.agree_num * WEIGHT_AGREE
            + self.share_num * WEIGHT_SHARE
    }

    pub fn to_document(&self) -> Result<Document> {
        Ok(into_document(serde_json::to_value(self)?))
    }
}

/// One ranking snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularRank {
    /// `popular-<granularity>-<YYYYMMDDHHMMSS>`
    pub id: String,
    /// Creation time, epoch seconds.
    pub timestamp: i64,
    pub temporal_granularity: String,
    pub article_aid_list: Vec<String>,
}

impl PopularRank {
    pub fn to_document(&self) -> Result<Document> {
        Ok(into_document(serde_json::to_value(self)?))
    }
}

/// Summary of one Be-Read run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeReadReport {
    pub events_scanned: usize,
    pub events_skipped: usize,
    pub records: usize,
    /// Records whose article no shard holds; not written.
    pub unplaced: usize,
    pub written: ShardCounts,
}
