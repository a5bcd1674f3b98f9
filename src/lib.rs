//! Sharded News Store Library
//!
//! Partition-aware routing and cross-shard aggregation over two document
//! shards holding users, articles, read events, and the engagement data
//! derived from them. It serves as the foundation for the `sharded_news`
//! command shell and the `shard_node` server binaries.
//!
//! ## Architecture Modules
//! The system is layered, leaves first:
//!
//! - **`partition`**: The placement rules. Maps a record to its owning shard by region,
//!   category, or the record it references, and keeps a ledger of article placements.
//! - **`storage`**: Per-shard document primitives (`ShardStore`), in-memory and HTTP
//!   backends, the shard node handlers, and the `ShardRegistry` that owns both shards.
//! - **`router`**: The query router. Fans reads out to both shards, groups inserts by
//!   destination, and applies the try-A-then-B policy to updates and deletes.
//! - **`join`**: In-memory equi-joins across shards, plus the read-articles and
//!   top-articles lookups and read-only media resolution.
//! - **`aggregation`**: The batch pipeline deriving Be-Read counters and Popular-Rank
//!   snapshots from read events.
//! - **`ingestion`**: Bulk load of pre-partitioned JSON files.
//! - **`command`**: The text command surface.
//! - **`document`**, **`config`**, **`error`**: Record model and filter grammar,
//!   environment configuration, and the shared error type.

pub mod aggregation;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod ingestion;
pub mod join;
pub mod partition;
pub mod router;
pub mod storage;

#[cfg(test)]
mod test_support;
