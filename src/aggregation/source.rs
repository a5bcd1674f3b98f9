use crate::document::filter::Filter;
use crate::document::types::{Document, scalar_string};
use crate::error::{ClusterError, Result};
use crate::partition::policy::{FIELD_AID, FIELD_CATEGORY};
use crate::partition::types::CollectionKind;
use crate::router::router::QueryRouter;
use crate::storage::store::ShardStore;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const READ_LOG: &str = "read.dat";
pub const ARTICLE_LOG: &str = "article.dat";

/// Where the Be-Read pass takes its events and article categories from.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    /// Newline-delimited JSON logs on disk.
    Files { read_log: PathBuf, article_log: PathBuf },
    /// The `Read` and `Article` collections of both shards.
    Shards,
}

impl EventSource {
    /// `read.dat` and `article.dat` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        EventSource::Files {
            read_log: dir.join(READ_LOG),
            article_log: dir.join(ARTICLE_LOG),
        }
    }

    /// Read events plus the aid to category map.
    pub async fn load<S: ShardStore>(
        &self,
        router: &QueryRouter<S>,
    ) -> Result<(Vec<Document>, HashMap<String, String>)> {
        let (reads, articles) = match self {
            EventSource::Files {
                read_log,
                article_log,
            } => (read_ndjson(read_log).await?, read_ndjson(article_log).await?),
            EventSource::Shards => {
                let all = Filter::all();
                tokio::try_join!(
                    router.route_find(CollectionKind::Read, &all),
                    router.route_find(CollectionKind::Article, &all),
                )?
            }
        };
        Ok((reads, category_map(&articles)))
    }
}

fn category_map(articles: &[Document]) -> HashMap<String, String> {
    articles
        .iter()
        .filter_map(|article| {
            let aid = scalar_string(article, FIELD_AID)?;
            let category = scalar_string(article, FIELD_CATEGORY)?;
            Some((aid, category))
        })
        .collect()
}

/// Parses one JSON object per line. Blank lines are ignored and unparsable
/// lines are skipped with a warning; a missing file is fatal.
pub async fn read_ndjson(path: &Path) -> Result<Vec<Document>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ClusterError::AggregationSourceMissing {
                path: path.display().to_string(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    let mut docs = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(line) {
            Ok(doc) => docs.push(doc),
            Err(err) => {
                tracing::warn!(
                    "Skipping line {} of {}: {}",
                    line_no + 1,
                    path.display(),
                    err
                );
            }
        }
    }
    Ok(docs)
}
