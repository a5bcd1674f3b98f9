use super::types::BeRead;
use crate::document::types::{Document, record_id, scalar_string, truthy};
use crate::partition::policy::{FIELD_AID, FIELD_UID};

use serde_json::Value;
use std::collections::HashMap;

pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_COMMENT: &str = "commentOrNot";
pub const FIELD_AGREE: &str = "agreeOrNot";
pub const FIELD_SHARE: &str = "shareOrNot";

/// Anything at or above this is a millisecond timestamp.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Result of one scan over the read log.
#[derive(Debug, Clone, Default)]
pub struct Collapsed {
    /// One record per article, in order of first appearance.
    pub records: Vec<BeRead>,
    pub skipped: usize,
}

/// Collapses read events into per-article counters.
///
/// `readNum` counts every event; comment/agree/share count only flagged
/// events. The uid lists are distinct. The record timestamp is the latest
/// event time in epoch seconds. Events without `aid`, `uid`, or a numeric
/// `timestamp` are skipped.
pub fn collapse_reads(reads: &[Document], categories: &HashMap<String, String>) -> Collapsed {
    let mut records: Vec<BeRead> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0;

    for event in reads {
        let (Some(aid), Some(uid)) = (scalar_string(event, FIELD_AID), scalar_string(event, FIELD_UID))
        else {
            tracing::warn!("Skipping read '{}': missing aid or uid", record_id(event));
            skipped += 1;
            continue;
        };
        let Some(seconds) = event_seconds(event.get(FIELD_TIMESTAMP)) else {
            tracing::warn!(
                "Skipping read '{}': malformed timestamp {:?}",
                record_id(event),
                event.get(FIELD_TIMESTAMP)
            );
            skipped += 1;
            continue;
        };

        let slot = *slots.entry(aid.clone()).or_insert_with(|| {
            records.push(BeRead::empty(aid.clone(), categories.get(&aid).cloned(), seconds));
            records.len() - 1
        });
        let record = &mut records[slot];

        record.read_num += 1;
        push_distinct(&mut record.read_uid_list, &uid);
        if truthy(event.get(FIELD_COMMENT)) {
            record.comment_num += 1;
            push_distinct(&mut record.comment_uid_list, &uid);
        }
        if truthy(event.get(FIELD_AGREE)) {
            record.agree_num += 1;
            push_distinct(&mut record.agree_uid_list, &uid);
        }
        if truthy(event.get(FIELD_SHARE)) {
            record.share_num += 1;
            push_distinct(&mut record.share_uid_list, &uid);
        }
        record.timestamp = record.timestamp.max(seconds);
    }

    Collapsed { records, skipped }
}

fn push_distinct(list: &mut Vec<String>, uid: &str) {
    if !list.iter().any(|existing| existing == uid) {
        list.push(uid.to_string());
    }
}

/// Epoch seconds from a millisecond (or already second) timestamp, given as
/// a number or a numeric string.
pub fn event_seconds(value: Option<&Value>) -> Option<i64> {
    let raw = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if raw < 0 {
        return None;
    }
    Some(if raw >= MILLIS_THRESHOLD { raw / 1000 } else { raw })
}
