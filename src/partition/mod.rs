//! Partition Policy Module
//!
//! Decides which shard owns a record.
//!
//! ## Placement Rules
//! - **User**: by `region` (region A → shard A, region B → shard B).
//! - **Article**: by `category`; the shard-A category is placed on shard A with a
//!   configurable probability and on shard B otherwise. The shard-B category is
//!   always on shard B.
//! - **Read**: follows the shard of the referenced user.
//! - **Be-Read**: follows the shard of the referenced article.
//! - **Popular-Rank**: daily snapshots on shard A, every coarser granularity on shard B.
//!
//! Rules that need a lookup return a [`types::Placement`] reference which the
//! query router resolves; the policy itself never touches a shard.

pub mod ledger;
pub mod policy;
pub mod types;
