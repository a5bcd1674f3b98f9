//! Shard Storage Module
//!
//! Uniform per-shard document primitives and the registry that owns one
//! handle per shard.
//!
//! ## Core Concepts
//! - **Store**: `ShardStore` exposes find / insert_many / update_one / delete_one /
//!   list_collections for a single shard. No store call ever touches another shard.
//! - **Backends**: `MemoryStore` keeps documents in process; `RemoteStore` talks to a
//!   shard node over HTTP using the `protocol` DTOs.
//! - **Shard node**: `handlers` serve a `MemoryStore` to remote clients.
//! - **Registry**: `ShardRegistry` is constructed once at startup, verified, passed down
//!   to the router, and closed on shutdown.

pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod registry;
pub mod remote;
pub mod store;
