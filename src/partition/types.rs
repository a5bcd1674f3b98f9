use crate::error::ClusterError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One of the two backing stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShardId {
    A,
    B,
}

impl ShardId {
    /// Every shard, in merge order.
    pub const ALL: [ShardId; 2] = [ShardId::A, ShardId::B];

    pub fn other(self) -> ShardId {
        match self {
            ShardId::A => ShardId::B,
            ShardId::B => ShardId::A,
        }
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardId::A => write!(f, "A"),
            ShardId::B => write!(f, "B"),
        }
    }
}

/// The closed set of logical collections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    User,
    Article,
    Read,
    BeRead,
    PopularRank,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::User,
        CollectionKind::Article,
        CollectionKind::Read,
        CollectionKind::BeRead,
        CollectionKind::PopularRank,
    ];

    /// Collection name as stored on the shards.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::User => "User",
            CollectionKind::Article => "Article",
            CollectionKind::Read => "Read",
            CollectionKind::BeRead => "Be-Read",
            CollectionKind::PopularRank => "Popular-Rank",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "user" => Ok(CollectionKind::User),
            "article" => Ok(CollectionKind::Article),
            "read" => Ok(CollectionKind::Read),
            "beread" => Ok(CollectionKind::BeRead),
            "popularrank" => Ok(CollectionKind::PopularRank),
            _ => Err(ClusterError::UnknownCollection(s.to_string())),
        }
    }
}

/// Outcome of the partition policy for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Shard(ShardId),
    /// Owned by whichever shard holds the user with this `uid`.
    FollowUser(String),
    /// Owned by whichever shard holds the article with this `aid`.
    FollowArticle(String),
}

/// Ranking window size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::AllTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::AllTime => "alltime",
        }
    }

    pub fn window(self) -> Duration {
        const DAY: u64 = 24 * 60 * 60;
        match self {
            Granularity::Daily => Duration::from_secs(DAY),
            Granularity::Weekly => Duration::from_secs(7 * DAY),
            Granularity::Monthly => Duration::from_secs(30 * DAY),
            Granularity::AllTime => Duration::from_secs(1000 * 7 * DAY),
        }
    }

    /// Labels a stored snapshot may carry, including the legacy `20years`.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Granularity::Daily => &["daily"],
            Granularity::Weekly => &["weekly"],
            Granularity::Monthly => &["monthly"],
            Granularity::AllTime => &["alltime", "20years"],
        }
    }

    /// Fixed snapshot placement: daily on shard A, the rest on shard B.
    pub fn home_shard(self) -> ShardId {
        match self {
            Granularity::Daily => ShardId::A,
            _ => ShardId::B,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Granularity {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "alltime" | "all-time" | "all_time" | "20years" => Ok(Granularity::AllTime),
            other => Err(ClusterError::malformed(format!(
                "unknown granularity '{other}'"
            ))),
        }
    }
}
