use super::ledger::PlacementLedger;
use super::types::{CollectionKind, Granularity, Placement, ShardId};
use crate::document::types::{Document, record_id, scalar_string};
use crate::error::{ClusterError, Result};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

pub const FIELD_REGION: &str = "region";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_UID: &str = "uid";
pub const FIELD_AID: &str = "aid";
pub const FIELD_GRANULARITY: &str = "temporalGranularity";

/// Source of uniform samples in `[0, 1)` for the probabilistic article rule.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// `StdRng`-backed source; seeded for reproducible placement runs.
pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.r#gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().r#gen::<f64>(),
        }
    }
}

/// Field values that select each shard.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRules {
    pub region_a: String,
    pub region_b: String,
    pub category_a: String,
    pub category_b: String,
    /// Probability that a shard-A category article lands on shard A.
    pub category_a_affinity: f64,
}

impl Default for PartitionRules {
    fn default() -> Self {
        Self {
            region_a: "Beijing".to_string(),
            region_b: "Hong Kong".to_string(),
            category_a: "science".to_string(),
            category_b: "technology".to_string(),
            category_a_affinity: 0.8,
        }
    }
}

pub struct PartitionPolicy {
    rules: PartitionRules,
    random: Box<dyn RandomSource>,
    ledger: Arc<PlacementLedger>,
}

impl PartitionPolicy {
    pub fn new(rules: PartitionRules, random: Box<dyn RandomSource>) -> Self {
        Self {
            rules,
            random,
            ledger: Arc::new(PlacementLedger::new()),
        }
    }

    pub fn rules(&self) -> &PartitionRules {
        &self.rules
    }

    pub fn ledger(&self) -> &Arc<PlacementLedger> {
        &self.ledger
    }

    /// Fields that decide where a record of `kind` lives. Patches may not touch them.
    pub fn placement_fields(kind: CollectionKind) -> &'static [&'static str] {
        match kind {
            CollectionKind::User => &[FIELD_REGION, FIELD_UID],
            CollectionKind::Article => &[FIELD_CATEGORY, FIELD_AID],
            CollectionKind::Read => &[FIELD_UID, FIELD_AID],
            CollectionKind::BeRead => &[FIELD_AID],
            CollectionKind::PopularRank => &[FIELD_GRANULARITY],
        }
    }

    /// Maps a record to its owner, or to the reference that determines it.
    pub fn shard_for(&self, kind: CollectionKind, doc: &Document) -> Result<Placement> {
        match kind {
            CollectionKind::User => self.user_shard(doc).map(Placement::Shard),
            CollectionKind::Article => self.article_shard(doc).map(Placement::Shard),
            CollectionKind::Read => {
                let uid = required(kind, doc, FIELD_UID)?;
                Ok(Placement::FollowUser(uid))
            }
            CollectionKind::BeRead => {
                let aid = required(kind, doc, FIELD_AID)?;
                Ok(Placement::FollowArticle(aid))
            }
            CollectionKind::PopularRank => {
                let name = required(kind, doc, FIELD_GRANULARITY)?;
                let granularity: Granularity = name.parse().map_err(|_| {
                    ClusterError::unroutable(
                        kind.name(),
                        record_id(doc),
                        format!("unknown granularity '{name}'"),
                    )
                })?;
                Ok(Placement::Shard(granularity.home_shard()))
            }
        }
    }

    /// Region rule alone; used to audit where a user should live.
    pub fn user_shard(&self, doc: &Document) -> Result<ShardId> {
        let region = required(CollectionKind::User, doc, FIELD_REGION)?;
        if region == self.rules.region_a {
            Ok(ShardId::A)
        } else if region == self.rules.region_b {
            Ok(ShardId::B)
        } else {
            Err(ClusterError::unroutable(
                CollectionKind::User.name(),
                record_id(doc),
                format!("unknown region '{region}'"),
            ))
        }
    }

    fn article_shard(&self, doc: &Document) -> Result<ShardId> {
        let category = required(CollectionKind::Article, doc, FIELD_CATEGORY)?;
        let shard = if category == self.rules.category_a {
            if self.random.next_unit() < self.rules.category_a_affinity {
                ShardId::A
            } else {
                ShardId::B
            }
        } else if category == self.rules.category_b {
            ShardId::B
        } else {
            return Err(ClusterError::unroutable(
                CollectionKind::Article.name(),
                record_id(doc),
                format!("unknown category '{category}'"),
            ));
        };
        Ok(shard)
    }
}

fn required(kind: CollectionKind, doc: &Document, field: &str) -> Result<String> {
    scalar_string(doc, field).ok_or_else(|| {
        ClusterError::unroutable(kind.name(), record_id(doc), format!("missing '{field}'"))
    })
}
