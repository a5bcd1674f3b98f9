use super::be_read::collapse_reads;
use super::popular_rank::compute_rankings;
use super::source::EventSource;
use super::types::{BeRead, BeReadReport, PopularRank};
use crate::document::filter::Filter;
use crate::document::types::{Document, record_id};
use crate::error::{ClusterError, Result};
use crate::partition::types::{CollectionKind, ShardId};
use crate::router::router::QueryRouter;
use crate::router::types::ShardCounts;
use crate::storage::store::ShardStore;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Runs the two derivation passes and persists their output through the router.
pub struct AggregationPipeline<S> {
    router: Arc<QueryRouter<S>>,
}

impl<S: ShardStore> AggregationPipeline<S> {
    pub fn new(router: Arc<QueryRouter<S>>) -> Self {
        Self { router }
    }

    /// Pass A. With `clear_first`, existing Be-Read rows are dropped on both
    /// shards so a rerun does not double count. Every record is placed before
    /// the clear, so a placement failure leaves the previous rows in place.
    pub async fn materialize_be_read(
        &self,
        source: &EventSource,
        clear_first: bool,
    ) -> Result<BeReadReport> {
        let (reads, categories) = source.load(self.router.as_ref()).await?;
        let collapsed = collapse_reads(&reads, &categories);
        tracing::info!(
            "Collapsed {} read event(s) into {} Be-Read record(s), {} skipped",
            reads.len(),
            collapsed.records.len(),
            collapsed.skipped
        );

        let mut groups: BTreeMap<ShardId, Vec<Document>> = BTreeMap::new();
        let mut unplaced = 0;
        for record in &collapsed.records {
            let doc = record.to_document()?;
            match self.router.resolve_shard(CollectionKind::BeRead, &doc).await {
                Ok(shard) => groups.entry(shard).or_default().push(doc),
                Err(err @ ClusterError::DanglingReference { .. }) => {
                    tracing::warn!("Skipping Be-Read '{}': {}", record_id(&doc), err);
                    unplaced += 1;
                }
                Err(err) => return Err(err),
            }
        }

        if clear_first {
            let cleared = self.router.route_clear(CollectionKind::BeRead).await?;
            tracing::info!("Cleared Be-Read ({})", cleared);
        }
        let written = self.router.insert_grouped(CollectionKind::BeRead, groups).await?;

        Ok(BeReadReport {
            events_scanned: reads.len(),
            events_skipped: collapsed.skipped,
            records: collapsed.records.len(),
            unplaced,
            written,
        })
    }

    /// Pass B over every Be-Read record on both shards, as of `now`.
    pub async fn materialize_popular_rank(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(Vec<PopularRank>, ShardCounts)> {
        let stored = self
            .router
            .route_find(CollectionKind::BeRead, &Filter::all())
            .await?;
        let records: Vec<BeRead> = stored
            .into_iter()
            .filter_map(|doc| {
                let id = record_id(&doc);
                match serde_json::from_value::<BeRead>(doc.into()) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        tracing::warn!("Skipping malformed Be-Read '{}': {}", id, err);
                        None
                    }
                }
            })
            .collect();

        let snapshots = compute_rankings(&records, now);
        let docs = snapshots
            .iter()
            .map(PopularRank::to_document)
            .collect::<Result<Vec<_>>>()?;
        let written = self
            .router
            .route_insert(CollectionKind::PopularRank, docs)
            .await?;
        for snapshot in &snapshots {
            tracing::info!(
                "Popular-Rank '{}': {:?}",
                snapshot.id,
                snapshot.article_aid_list
            );
        }
        Ok((snapshots, written))
    }
}
