use super::parser::parse_command;
use super::types::{Command, Reply, USAGE};
use crate::aggregation::pipeline::AggregationPipeline;
use crate::aggregation::source::EventSource;
use crate::document::types::{Document, record_id};
use crate::error::Result;
use crate::ingestion::loader::load_partitioned;
use crate::join::engine::JoinEngine;
use crate::join::media::MediaStore;
use crate::partition::types::CollectionKind;
use crate::router::router::QueryRouter;
use crate::router::types::ShardCounts;
use crate::storage::store::ShardStore;

use std::sync::Arc;

/// Executes parsed commands against the router and renders per-shard output.
pub struct Shell<S, M> {
    router: Arc<QueryRouter<S>>,
    joins: JoinEngine<S>,
    pipeline: AggregationPipeline<S>,
    media: Option<M>,
}

impl<S: ShardStore, M: MediaStore> Shell<S, M> {
    pub fn new(router: Arc<QueryRouter<S>>, media: Option<M>) -> Self {
        Self {
            joins: JoinEngine::new(router.clone()),
            pipeline: AggregationPipeline::new(router.clone()),
            router,
            media,
        }
    }

    /// Parses and executes one line. Failures become an `Error:` line so the
    /// session keeps going.
    pub async fn run_line(&self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::Lines(Vec::new());
        }
        let outcome = match parse_command(line) {
            Ok(command) => self.execute(command).await,
            Err(err) => Err(err),
        };
        outcome.unwrap_or_else(|err| {
            tracing::warn!("Command '{}' failed: {}", line.trim(), err);
            Reply::Lines(vec![format!("Error: {err}")])
        })
    }

    pub async fn execute(&self, command: Command) -> Result<Reply> {
        let mut out = Vec::new();
        match command {
            Command::Status => {
                for (shard, collections) in self.router.route_status().await? {
                    let names: Vec<_> = collections.into_iter().collect();
                    out.push(format!("Shard {} collections: [{}]", shard, names.join(", ")));
                }
            }
            Command::Find { collection, filter } => {
                out.push(format!("Results from collection '{collection}':"));
                for (shard, docs) in self.router.find_per_shard(collection, &filter).await? {
                    out.push(format!("Shard {}: {} document(s)", shard, docs.len()));
                    out.extend(docs.iter().map(render));
                }
            }
            Command::Insert {
                collection,
                document,
            } => {
                let report = self.router.route_insert(collection, vec![document]).await?;
                write_counts(&mut out, "Inserted", "into", collection, &report);
            }
            Command::InsertMultiple {
                collection,
                documents,
            } => {
                let report = self.router.route_insert(collection, documents).await?;
                write_counts(&mut out, "Inserted", "into", collection, &report);
            }
            Command::Update {
                collection,
                filter,
                patch,
            } => {
                let report = self.router.route_update(collection, &filter, &patch).await?;
                write_counts(&mut out, "Modified", "in", collection, &report);
            }
            Command::Delete { collection, filter } => {
                let report = self.router.route_delete(collection, &filter).await?;
                write_counts(&mut out, "Deleted", "from", collection, &report);
            }
            Command::Join {
                left,
                right,
                match_key,
                left_filter,
                right_filter,
            } => {
                let rows = self
                    .joins
                    .join(left, right, &match_key, &left_filter, &right_filter)
                    .await?;
                out.push(format!(
                    "{} joined record(s) from '{}' and '{}' on '{}'",
                    rows.len(),
                    left,
                    right,
                    match_key
                ));
                out.extend(rows.iter().map(render));
            }
            Command::FindArticlesRead { user_filter } => {
                let articles = self.joins.read_articles_by_user(&user_filter).await?;
                out.push(format!("{} article(s) read by matching users", articles.len()));
                out.extend(articles.iter().map(render));
            }
            Command::FindTopArticles { granularity } => {
                let ranked = self
                    .joins
                    .top_articles(granularity, self.media.as_ref())
                    .await?;
                out.push(format!("Top {} article(s), {}:", ranked.len(), granularity));
                for entry in ranked {
                    let title = entry
                        .article
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    out.push(format!("#{} {} {}", entry.rank, record_id(&entry.article), title));
                    for blob in &entry.media {
                        match blob.size() {
                            Some(bytes) => out.push(format!("  {} ({} bytes)", blob.filename, bytes)),
                            None => out.push(format!("  {} (missing)", blob.filename)),
                        }
                    }
                }
            }
            Command::Load { dir } => {
                for load in load_partitioned(self.router.as_ref(), &dir, true).await? {
                    out.push(format!(
                        "Loaded {} document(s) from {} into shard {} collection '{}'",
                        load.inserted, load.file_name, load.shard, load.collection
                    ));
                }
            }
            Command::AggregateBeRead { log_dir } => {
                let source = match log_dir {
                    Some(dir) => EventSource::from_dir(dir),
                    None => EventSource::Shards,
                };
                let report = self.pipeline.materialize_be_read(&source, true).await?;
                out.push(format!(
                    "Scanned {} read event(s), skipped {}; {} Be-Read record(s), {} without a placed article",
                    report.events_scanned, report.events_skipped, report.records, report.unplaced
                ));
                write_counts(&mut out, "Inserted", "into", CollectionKind::BeRead, &report.written);
            }
            Command::AggregatePopularRank => {
                let (snapshots, written) = self
                    .pipeline
                    .materialize_popular_rank(chrono::Utc::now())
                    .await?;
                for snapshot in &snapshots {
                    out.push(format!(
                        "{}: [{}]",
                        snapshot.id,
                        snapshot.article_aid_list.join(", ")
                    ));
                }
                write_counts(&mut out, "Inserted", "into", CollectionKind::PopularRank, &written);
            }
            Command::Audit => {
                let violations = self.router.audit_reads().await?;
                if violations.is_empty() {
                    out.push("No placement violations".to_string());
                }
                out.extend(violations.iter().map(ToString::to_string));
            }
            Command::Help => out.push(USAGE.to_string()),
            Command::Exit => return Ok(Reply::Exit),
        }
        Ok(Reply::Lines(out))
    }
}

fn write_counts(
    out: &mut Vec<String>,
    verb: &str,
    preposition: &str,
    collection: CollectionKind,
    report: &ShardCounts,
) {
    if report.counts.is_empty() {
        out.push(format!("{verb} 0 document(s) {preposition} collection '{collection}'"));
    }
    for (shard, count) in &report.counts {
        out.push(format!(
            "{verb} {count} document(s) {preposition} shard {shard} collection '{collection}'"
        ));
    }
}

fn render(doc: &Document) -> String {
    serde_json::to_string(doc).unwrap_or_else(|_| format!("<unrenderable {}>", record_id(doc)))
}
