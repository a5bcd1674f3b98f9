use super::types::{BeRead, PopularRank, TOP_K};
use crate::partition::types::Granularity;

use chrono::{DateTime, Utc};

/// Generation id for a snapshot taken at `now`.
pub fn generation_id(granularity: Granularity, now: DateTime<Utc>) -> String {
    format!("popular-{}-{}", granularity.name(), now.format("%Y%m%d%H%M%S"))
}

/// Top articles of `records` inside `granularity`'s window ending at `now`.
///
/// Scores tie by input order. Returns `None` when no record falls in the window.
pub fn rank_window(
    records: &[BeRead],
    granularity: Granularity,
    now: DateTime<Utc>,
) -> Option<PopularRank> {
    let cutoff = now.timestamp() - granularity.window().as_secs() as i64;
    let mut scored: Vec<(&str, u64)> = records
        .iter()
        .filter(|record| record.timestamp >= cutoff)
        .map(|record| (record.aid.as_str(), record.score()))
        .collect();
    if scored.is_empty() {
        return None;
    }
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    Some(PopularRank {
        id: generation_id(granularity, now),
        timestamp: now.timestamp(),
        temporal_granularity: granularity.name().to_string(),
        article_aid_list: scored
            .into_iter()
            .take(TOP_K)
            .map(|(aid, _)| aid.to_string())
            .collect(),
    })
}

/// One snapshot per granularity that has any record in its window.
pub fn compute_rankings(records: &[BeRead], now: DateTime<Utc>) -> Vec<PopularRank> {
    Granularity::ALL
        .into_iter()
        .filter_map(|granularity| {
            let snapshot = rank_window(records, granularity, now);
            if snapshot.is_none() {
                tracing::info!("No Be-Read records inside the {} window", granularity);
            }
            snapshot
        })
        .collect()
}
