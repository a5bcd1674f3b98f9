use super::types::{PlacementViolation, ShardCounts, WritePolicy};
use crate::document::filter::{Filter, Patch};
use crate::document::types::{Document, key_variants, record_id, scalar_string};
use crate::error::{ClusterError, Result};
use crate::partition::policy::{FIELD_AID, FIELD_UID, PartitionPolicy};
use crate::partition::types::{CollectionKind, Placement, ShardId};
use crate::storage::registry::ShardRegistry;
use crate::storage::store::ShardStore;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Partition-aware front door to both shards.
pub struct QueryRouter<S> {
    registry: Arc<ShardRegistry<S>>,
    policy: PartitionPolicy,
    write_policy: WritePolicy,
}

impl<S: ShardStore> QueryRouter<S> {
    pub fn new(
        registry: Arc<ShardRegistry<S>>,
        policy: PartitionPolicy,
        write_policy: WritePolicy,
    ) -> Self {
        Self {
            registry,
            policy,
            write_policy,
        }
    }

    pub fn registry(&self) -> &Arc<ShardRegistry<S>> {
        &self.registry
    }

    pub fn policy(&self) -> &PartitionPolicy {
        &self.policy
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    // ------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------

    /// Same filter on every shard, results concatenated A then B.
    pub async fn route_find(&self, kind: CollectionKind, filter: &Filter) -> Result<Vec<Document>> {
        let per_shard = self.find_per_shard(kind, filter).await?;
        Ok(per_shard.into_iter().flat_map(|(_, docs)| docs).collect())
    }

    /// Concurrent fan-out; the returned segments are always in shard order.
    pub async fn find_per_shard(
        &self,
        kind: CollectionKind,
        filter: &Filter,
    ) -> Result<Vec<(ShardId, Vec<Document>)>> {
        let name = kind.name();
        let (from_a, from_b) = tokio::try_join!(
            self.registry.shard(ShardId::A).find(name, filter),
            self.registry.shard(ShardId::B).find(name, filter),
        )?;
        tracing::debug!(
            "find '{}': {} from shard A, {} from shard B",
            name,
            from_a.len(),
            from_b.len()
        );
        Ok(vec![(ShardId::A, from_a), (ShardId::B, from_b)])
    }

    pub async fn route_status(&self) -> Result<BTreeMap<ShardId, BTreeSet<String>>> {
        let (a, b) = tokio::try_join!(
            self.registry.shard(ShardId::A).list_collections(),
            self.registry.shard(ShardId::B).list_collections(),
        )?;
        Ok(BTreeMap::from([(ShardId::A, a), (ShardId::B, b)]))
    }

    // ------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------

    /// Resolves the owning shard of one record, following references.
    pub async fn resolve_shard(&self, kind: CollectionKind, doc: &Document) -> Result<ShardId> {
        let mut cache = HashMap::new();
        self.resolve_cached(kind, doc, &mut cache).await
    }

    async fn resolve_cached(
        &self,
        kind: CollectionKind,
        doc: &Document,
        cache: &mut HashMap<(CollectionKind, String), ShardId>,
    ) -> Result<ShardId> {
        let (target, field, key) = match self.policy.shard_for(kind, doc)? {
            Placement::Shard(shard) => return Ok(shard),
            Placement::FollowUser(uid) => (CollectionKind::User, FIELD_UID, uid),
            Placement::FollowArticle(aid) => {
                if let Some(shard) = self.ledgered_article(&aid).await? {
                    return Ok(shard);
                }
                (CollectionKind::Article, FIELD_AID, aid)
            }
        };

        if let Some(shard) = cache.get(&(target, key.clone())) {
            return Ok(*shard);
        }
        match self.owner_of(target, field, &key).await? {
            Some(shard) => {
                cache.insert((target, key), shard);
                Ok(shard)
            }
            None => Err(ClusterError::DanglingReference {
                collection: kind.name().to_string(),
                record_id: record_id(doc),
                target: target.name().to_string(),
                key,
            }),
        }
    }

    /// Ledger hit confirmed on the shard it names. A stale entry is dropped
    /// and resolution falls back to asking both shards.
    async fn ledgered_article(&self, aid: &str) -> Result<Option<ShardId>> {
        let ledger = self.policy.ledger();
        let Some(shard) = ledger.lookup(aid) else {
            return Ok(None);
        };
        let filter = Filter::is_in(FIELD_AID, key_variants(aid));
        let found = self
            .registry
            .shard(shard)
            .find(CollectionKind::Article.name(), &filter)
            .await?;
        if found.is_empty() {
            tracing::warn!(
                "Ledger places article '{}' on shard {}, which no longer holds it",
                aid,
                shard
            );
            ledger.forget(aid);
            return Ok(None);
        }
        Ok(Some(shard))
    }

    /// The single shard holding a record whose `field` equals `key`.
    pub async fn owner_of(
        &self,
        kind: CollectionKind,
        field: &str,
        key: &str,
    ) -> Result<Option<ShardId>> {
        let filter = Filter::is_in(field, key_variants(key));
        let per_shard = self.find_per_shard(kind, &filter).await?;
        let owners: Vec<ShardId> = per_shard
            .into_iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(shard, _)| shard)
            .collect();
        match owners.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(ClusterError::SplitOwnership {
                target: kind.name().to_string(),
                key: key.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------

    /// Places every record, then writes one batch per shard.
    ///
    /// Resolution happens before any write, so an unplaceable record aborts
    /// the batch with nothing written. A shard failure after an earlier shard
    /// committed is reported as `PartialInsert`; committed groups stay.
    pub async fn route_insert(
        &self,
        kind: CollectionKind,
        documents: Vec<Document>,
    ) -> Result<ShardCounts> {
        let mut groups: BTreeMap<ShardId, Vec<Document>> = BTreeMap::new();
        let mut cache = HashMap::new();
        for doc in documents {
            let shard = self.resolve_cached(kind, &doc, &mut cache).await?;
            groups.entry(shard).or_default().push(doc);
        }
        self.insert_grouped(kind, groups).await
    }

    /// Writes pre-placed groups, shard A first. Article placements enter the
    /// ledger once their shard has accepted them.
    pub async fn insert_grouped(
        &self,
        kind: CollectionKind,
        groups: BTreeMap<ShardId, Vec<Document>>,
    ) -> Result<ShardCounts> {
        let mut report = ShardCounts::default();
        for (shard, docs) in groups {
            if docs.is_empty() {
                continue;
            }
            let placed: Vec<String> = match kind {
                CollectionKind::Article => docs
                    .iter()
                    .filter_map(|doc| scalar_string(doc, FIELD_AID))
                    .collect(),
                _ => Vec::new(),
            };
            match self.registry.shard(shard).insert_many(kind.name(), docs).await {
                Ok(count) => {
                    for aid in &placed {
                        self.policy.ledger().record(aid, shard);
                    }
                    tracing::info!(
                        "Inserted {} document(s) into shard {}, collection '{}'",
                        count,
                        shard,
                        kind
                    );
                    report.push(shard, count as u64);
                }
                Err(err) if report.counts.is_empty() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        "Insert into '{}' partially applied ({}); shard {} failed: {}",
                        kind,
                        report,
                        shard,
                        err
                    );
                    return Err(ClusterError::PartialInsert {
                        collection: kind.name().to_string(),
                        committed: report.counts,
                        failed: shard,
                        source: Box::new(err),
                    });
                }
            }
        }
        Ok(report)
    }

    /// "Set fields" update on the first matching record. Fields that decide
    /// placement are rejected: records never move between shards.
    pub async fn route_update(
        &self,
        kind: CollectionKind,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<ShardCounts> {
        if let Some(field) = PartitionPolicy::placement_fields(kind)
            .iter()
            .find(|field| patch.fields().contains_key(**field))
        {
            return Err(ClusterError::malformed(format!(
                "update on '{kind}' may not change placement field '{field}'"
            )));
        }

        let mut report = ShardCounts::default();
        for shard in ShardId::ALL {
            let modified = self
                .registry
                .shard(shard)
                .update_one(kind.name(), filter, patch)
                .await?;
            report.push(shard, modified);
            if self.write_policy == WritePolicy::FirstMatch {
                if modified > 0 {
                    break;
                }
                if shard == ShardId::A {
                    tracing::warn!("update '{}': no match on shard A, trying shard B", kind);
                }
            }
        }
        if report.total() == 0 {
            tracing::debug!("update '{}': no matching document on any shard", kind);
        }
        Ok(report)
    }

    pub async fn route_delete(&self, kind: CollectionKind, filter: &Filter) -> Result<ShardCounts> {
        let mut report = ShardCounts::default();
        for shard in ShardId::ALL {
            let deleted = self
                .registry
                .shard(shard)
                .delete_one(kind.name(), filter)
                .await?;
            report.push(shard, deleted);
            if self.write_policy == WritePolicy::FirstMatch {
                if deleted > 0 {
                    break;
                }
                if shard == ShardId::A {
                    tracing::warn!("delete '{}': no match on shard A, trying shard B", kind);
                }
            }
        }
        Ok(report)
    }

    /// Empties a collection on every shard.
    pub async fn route_clear(&self, kind: CollectionKind) -> Result<ShardCounts> {
        let name = kind.name();
        let (a, b) = tokio::try_join!(
            self.registry.shard(ShardId::A).clear(name),
            self.registry.shard(ShardId::B).clear(name),
        )?;
        if kind == CollectionKind::Article {
            for shard in ShardId::ALL {
                self.policy.ledger().forget_shard(shard);
            }
        }
        Ok(ShardCounts {
            counts: vec![(ShardId::A, a), (ShardId::B, b)],
        })
    }

    // ------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------

    /// Lists every Read not co-located with its user. Nothing is moved.
    pub async fn audit_reads(&self) -> Result<Vec<PlacementViolation>> {
        let mut user_shards: HashMap<String, ShardId> = HashMap::new();
        for (shard, users) in self.find_per_shard(CollectionKind::User, &Filter::all()).await? {
            for user in users {
                if let Some(uid) = scalar_string(&user, FIELD_UID) {
                    user_shards.insert(uid, shard);
                }
            }
        }

        let mut violations = Vec::new();
        for (stored_on, reads) in self.find_per_shard(CollectionKind::Read, &Filter::all()).await? {
            for read in reads {
                let uid = scalar_string(&read, FIELD_UID).unwrap_or_default();
                let user_shard = user_shards.get(&uid).copied();
                if user_shard != Some(stored_on) {
                    let violation = PlacementViolation {
                        read_id: record_id(&read),
                        uid,
                        stored_on,
                        user_shard,
                    };
                    tracing::warn!("Placement violation: {}", violation);
                    violations.push(violation);
                }
            }
        }
        Ok(violations)
    }
}
