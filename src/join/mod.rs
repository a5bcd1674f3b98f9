//! Cross-Shard Join Module
//!
//! In-memory equi-joins over collections scattered across both shards.
//!
//! ## Join Model
//! 1. **Scatter**: the left collection is fetched from every shard through the router.
//! 2. **Key set**: distinct join-key values of the left rows drive an `$in` fetch of the
//!    right collection, again from every shard.
//! 3. **Merge**: right rows are indexed by key and every left row is emitted once per
//!    matching right row, right fields overriding left fields. Unmatched left rows are dropped.
//!
//! ## Submodules
//! - **`engine`**: `JoinEngine` and the two analytical specializations.
//! - **`media`**: read-only blob lookup for article text, images and video.
//! - **`types`**: ranked article results.

pub mod engine;
pub mod media;
pub mod types;
