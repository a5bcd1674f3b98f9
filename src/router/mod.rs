//! Query Router Module
//!
//! Turns logical collection operations into per-shard store calls.
//!
//! ## Routing Model
//! 1. **Reads** fan out to every shard with the same filter and concatenate the
//!    results in shard order (A then B). Duplicates are surfaced, never hidden.
//! 2. **Inserts** are placed record by record through the partition policy, grouped by
//!    destination, and written with one `insert_many` per shard.
//! 3. **Updates / Deletes** try shard A first and fall back to shard B only when A
//!    reports no effect. A broadcast policy that always hits both shards is available.
//!
//! ## Submodules
//! - **`router`**: `QueryRouter`, the routing engine.
//! - **`types`**: write policy and per-shard result reports.

pub mod router;
pub mod types;

#[cfg(test)]
mod tests;
