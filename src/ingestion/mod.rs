//! Bulk Ingestion Module
//!
//! Loads pre-partitioned JSON array files straight into their shards, bypassing
//! per-record placement.
//!
//! ## Workflow
//! 1. **Locate**: every expected file must exist before anything is written.
//! 2. **Clear** (optional): target collections are emptied on their shard.
//! 3. **Store**: one `insert_many` per file on the file's shard.
//! 4. **Ledger**: loaded article placements are recorded so later Be-Read
//!    placement resolves without a lookup.

pub mod loader;
pub mod types;
