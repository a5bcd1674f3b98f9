use crate::document::types::{Document, into_document};
use crate::partition::policy::{PartitionPolicy, PartitionRules, RandomSource};
use crate::router::router::QueryRouter;
use crate::router::types::WritePolicy;
use crate::storage::memory::MemoryStore;
use crate::storage::registry::ShardRegistry;

use serde_json::json;
use std::sync::{Arc, Mutex};

/// Replays a fixed sequence of samples, cycling when exhausted.
pub struct ScriptedRandom {
    samples: Vec<f64>,
    cursor: Mutex<usize>,
}

impl ScriptedRandom {
    pub fn boxed(samples: Vec<f64>) -> Box<Self> {
        Box::new(Self {
            samples,
            cursor: Mutex::new(0),
        })
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&self) -> f64 {
        let mut cursor = self.cursor.lock().unwrap();
        let sample = self.samples[*cursor % self.samples.len()];
        *cursor += 1;
        sample
    }
}

/// Two in-memory shards behind a router whose science articles always land on shard A.
pub fn memory_router() -> QueryRouter<MemoryStore> {
    memory_router_with(vec![0.0], WritePolicy::FirstMatch)
}

pub fn memory_router_with(samples: Vec<f64>, write_policy: WritePolicy) -> QueryRouter<MemoryStore> {
    let policy = PartitionPolicy::new(PartitionRules::default(), ScriptedRandom::boxed(samples));
    QueryRouter::new(Arc::new(ShardRegistry::in_memory()), policy, write_policy)
}

pub fn user(uid: u32, region: &str) -> Document {
    into_document(json!({
        "id": format!("u{uid}"),
        "uid": uid.to_string(),
        "name": format!("user{uid}"),
        "region": region,
        "grade": "grade1",
    }))
}

pub fn article(aid: u32, category: &str) -> Document {
    into_document(json!({
        "id": format!("a{aid}"),
        "aid": aid.to_string(),
        "title": format!("title{aid}"),
        "category": category,
        "language": "en",
        "text": format!("text_a{aid}.txt"),
        "image": format!("image_a{aid}_0.jpg,"),
        "video": "",
    }))
}

/// Read event; `ts_secs` is stored as a millisecond string like the event logs.
pub fn read(rid: u32, uid: u32, aid: u32, ts_secs: i64, flags: (bool, bool, bool)) -> Document {
    let (comment, agree, share) = flags;
    into_document(json!({
        "id": format!("r{rid}"),
        "uid": uid.to_string(),
        "aid": aid.to_string(),
        "timestamp": (ts_secs * 1000).to_string(),
        "readTimeLength": "10",
        "commentOrNot": if comment { "1" } else { "0" },
        "agreeOrNot": if agree { "1" } else { "0" },
        "shareOrNot": if share { "1" } else { "0" },
    }))
}
