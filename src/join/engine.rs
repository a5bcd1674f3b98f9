use super::media::{MediaStore, media_filenames};
use super::types::{MediaBlob, RankedArticle};
use crate::document::filter::{Condition, Filter};
use crate::document::types::{Document, key_variants, scalar_string};
use crate::error::Result;
use crate::partition::policy::{FIELD_AID, FIELD_GRANULARITY, FIELD_UID};
use crate::partition::types::{CollectionKind, Granularity};
use crate::router::router::QueryRouter;
use crate::storage::store::ShardStore;

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const FIELD_ARTICLE_LIST: &str = "articleAidList";
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Equi-joins over the router's scatter-gather reads.
pub struct JoinEngine<S> {
    router: Arc<QueryRouter<S>>,
}

impl<S: ShardStore> JoinEngine<S> {
    pub fn new(router: Arc<QueryRouter<S>>) -> Self {
        Self { router }
    }

    /// Inner one-to-many join of `left` to `right` on `match_key`.
    pub async fn join(
        &self,
        left: CollectionKind,
        right: CollectionKind,
        match_key: &str,
        left_filter: &Filter,
        right_filter: &Filter,
    ) -> Result<Vec<Document>> {
        let rows = self.router.route_find(left, left_filter).await?;
        self.join_rows(rows, right, match_key, right_filter).await
    }

    /// Joins already-fetched rows against a collection on both shards.
    pub async fn join_rows(
        &self,
        rows: Vec<Document>,
        right: CollectionKind,
        match_key: &str,
        right_filter: &Filter,
    ) -> Result<Vec<Document>> {
        let keys = distinct_keys(&rows, match_key);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        // A caller constraint on the key itself is kept as is; the key set
        // only narrows the fetch when the caller left the key open.
        let filter = if right_filter.constrains(match_key) {
            right_filter.clone()
        } else {
            right_filter
                .clone()
                .and(match_key, Condition::In(keys))
        };
        let matches = self.router.route_find(right, &filter).await?;

        let mut index: HashMap<String, Vec<Document>> = HashMap::new();
        for doc in matches {
            if let Some(key) = scalar_string(&doc, match_key) {
                index.entry(key).or_default().push(doc);
            }
        }

        let mut joined = Vec::new();
        for row in rows {
            let Some(key) = scalar_string(&row, match_key) else {
                continue;
            };
            for other in index.get(&key).into_iter().flatten() {
                let mut merged = row.clone();
                for (field, value) in other {
                    merged.insert(field.clone(), value.clone());
                }
                joined.push(merged);
            }
        }
        tracing::debug!(
            "join on '{}' into '{}': {} merged row(s)",
            match_key,
            right,
            joined.len()
        );
        Ok(joined)
    }

    /// Distinct articles read by the users matching `user_filter`, in first-read order.
    pub async fn read_articles_by_user(&self, user_filter: &Filter) -> Result<Vec<Document>> {
        let reads = self
            .join(
                CollectionKind::User,
                CollectionKind::Read,
                FIELD_UID,
                user_filter,
                &Filter::all(),
            )
            .await?;

        let keys = distinct_keys(&reads, FIELD_AID);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let articles = self
            .router
            .route_find(CollectionKind::Article, &Filter::is_in(FIELD_AID, keys))
            .await?;
        let by_aid = index_first(articles, FIELD_AID);

        let mut seen = HashSet::new();
        let mut touched = Vec::new();
        for read in &reads {
            let Some(aid) = scalar_string(read, FIELD_AID) else {
                continue;
            };
            if !seen.insert(aid.clone()) {
                continue;
            }
            if let Some(article) = by_aid.get(&aid) {
                touched.push(article.clone());
            }
        }
        Ok(touched)
    }

    /// Articles of the newest Popular-Rank snapshot for `granularity`, in rank order.
    pub async fn top_articles<M: MediaStore>(
        &self,
        granularity: Granularity,
        media: Option<&M>,
    ) -> Result<Vec<RankedArticle>> {
        let labels = granularity
            .labels()
            .iter()
            .map(|label| Value::from(*label))
            .collect();
        let snapshots = self
            .router
            .route_find(
                CollectionKind::PopularRank,
                &Filter::is_in(FIELD_GRANULARITY, labels),
            )
            .await?;

        let Some(snapshot) = newest_snapshot(snapshots) else {
            tracing::info!("No Popular-Rank snapshot for granularity '{}'", granularity);
            return Ok(Vec::new());
        };
        let ranked_aids: Vec<String> = match snapshot.get(FIELD_ARTICLE_LIST) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        if ranked_aids.is_empty() {
            return Ok(Vec::new());
        }

        let keys = ranked_aids.iter().flat_map(|aid| key_variants(aid)).collect();
        let articles = self
            .router
            .route_find(CollectionKind::Article, &Filter::is_in(FIELD_AID, keys))
            .await?;
        let by_aid = index_first(articles, FIELD_AID);

        let mut ranked = Vec::with_capacity(ranked_aids.len());
        for (position, aid) in ranked_aids.iter().enumerate() {
            let Some(article) = by_aid.get(aid) else {
                tracing::warn!(
                    "Popular-Rank '{}' lists article '{}' which no shard holds",
                    granularity,
                    aid
                );
                continue;
            };
            let blobs = match media {
                Some(store) => resolve_media(store, article).await?,
                None => Vec::new(),
            };
            ranked.push(RankedArticle {
                rank: position + 1,
                article: article.clone(),
                media: blobs,
            });
        }
        Ok(ranked)
    }
}

async fn resolve_media<M: MediaStore>(store: &M, article: &Document) -> Result<Vec<MediaBlob>> {
    let mut blobs = Vec::new();
    for filename in media_filenames(article) {
        let bytes = store.fetch(&filename).await?;
        if bytes.is_none() {
            tracing::warn!("Media file '{}' not found", filename);
        }
        blobs.push(MediaBlob { filename, bytes });
    }
    Ok(blobs)
}

/// Distinct key values in first-seen order, in every form that may be stored.
fn distinct_keys(rows: &[Document], key: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| scalar_string(row, key))
        .filter(|text| seen.insert(text.clone()))
        .flat_map(|text| key_variants(&text))
        .collect()
}

/// Key to first document holding it; later copies are ignored.
fn index_first(docs: Vec<Document>, key: &str) -> HashMap<String, Document> {
    let mut index = HashMap::new();
    for doc in docs {
        if let Some(k) = scalar_string(&doc, key) {
            index.entry(k).or_insert(doc);
        }
    }
    index
}

fn newest_snapshot(snapshots: Vec<Document>) -> Option<Document> {
    let timestamp = |doc: &Document| {
        doc.get(FIELD_TIMESTAMP)
            .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
            .unwrap_or(i64::MIN)
    };
    snapshots.into_iter().fold(None, |best, doc| match best {
        Some(current) if timestamp(&current) >= timestamp(&doc) => Some(current),
        _ => Some(doc),
    })
}
