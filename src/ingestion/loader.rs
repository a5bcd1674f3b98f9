use super::types::{FileLoad, PARTITIONED_FILES};
use crate::document::types::{Document, scalar_string};
use crate::error::{ClusterError, Result};
use crate::partition::policy::FIELD_AID;
use crate::partition::types::CollectionKind;
use crate::router::router::QueryRouter;
use crate::storage::store::ShardStore;

use std::collections::BTreeSet;
use std::path::Path;

/// Loads the partitioned files in `dir`, one `insert_many` per file.
///
/// All files are checked before the first write, so a missing file leaves
/// the shards untouched.
pub async fn load_partitioned<S: ShardStore>(
    router: &QueryRouter<S>,
    dir: &Path,
    clear_first: bool,
) -> Result<Vec<FileLoad>> {
    for file in &PARTITIONED_FILES {
        let path = dir.join(file.file_name);
        if !tokio::fs::try_exists(&path).await? {
            return Err(ClusterError::AggregationSourceMissing {
                path: path.display().to_string(),
            });
        }
    }

    if clear_first {
        let targets: BTreeSet<_> = PARTITIONED_FILES
            .iter()
            .map(|file| (file.shard, file.collection.name()))
            .collect();
        for (shard, collection) in targets {
            let removed = router.registry().shard(shard).clear(collection).await?;
            if collection == CollectionKind::Article.name() {
                router.policy().ledger().forget_shard(shard);
            }
            tracing::info!("Cleared {} document(s) from shard {} '{}'", removed, shard, collection);
        }
    }

    let mut loads = Vec::with_capacity(PARTITIONED_FILES.len());
    for file in &PARTITIONED_FILES {
        let path = dir.join(file.file_name);
        let text = tokio::fs::read_to_string(&path).await?;
        let docs: Vec<Document> = serde_json::from_str(&text)?;
        let placed: Vec<String> = match file.collection {
            CollectionKind::Article => docs
                .iter()
                .filter_map(|doc| scalar_string(doc, FIELD_AID))
                .collect(),
            _ => Vec::new(),
        };

        let inserted = if docs.is_empty() {
            0
        } else {
            router
                .registry()
                .shard(file.shard)
                .insert_many(file.collection.name(), docs)
                .await?
        };
        for aid in &placed {
            router.policy().ledger().record(aid, file.shard);
        }
        tracing::info!(
            "Loaded {} document(s) from {} into shard {} '{}'",
            inserted,
            file.file_name,
            file.shard,
            file.collection
        );
        loads.push(FileLoad {
            file_name: file.file_name.to_string(),
            collection: file.collection,
            shard: file.shard,
            inserted,
        });
    }
    Ok(loads)
}
