//! Aggregation Pipeline Module
//!
//! Batch derivation of engagement counters and popularity rankings from raw
//! read events. Runs off the request path and writes its results back through
//! the router.
//!
//! ## Passes
//! 1. **Be-Read** (`be_read`): one scan of the read log collapses events into one
//!    counter record per article, placed on the article's shard.
//! 2. **Popular-Rank** (`popular_rank`): for each granularity, Be-Read records inside
//!    the window are scored and the top five article ids are written as a snapshot.
//!
//! Bad events are skipped with a warning; a missing source file fails the pass.

pub mod be_read;
pub mod pipeline;
pub mod popular_rank;
pub mod source;
pub mod types;
