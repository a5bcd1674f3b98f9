//! Shard Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) used between the
//! router process and a shard node.
//!
//! Every request targets exactly one collection on exactly one shard; the
//! protocol has no notion of cross-shard work.

use crate::document::filter::{Filter, Patch};
use crate::document::types::Document;

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_FIND: &str = "/find";
pub const ENDPOINT_INSERT_MANY: &str = "/insert_many";
pub const ENDPOINT_UPDATE_ONE: &str = "/update_one";
pub const ENDPOINT_DELETE_ONE: &str = "/delete_one";
/// Removes every document of one collection.
pub const ENDPOINT_CLEAR: &str = "/clear";
pub const ENDPOINT_COLLECTIONS: &str = "/collections";
/// Liveness probe used by the registry at startup.
pub const ENDPOINT_PING: &str = "/ping";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct FindRequest {
    pub collection: String,
    pub filter: Filter,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindResponse {
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertManyRequest {
    pub collection: String,
    pub documents: Vec<Document>,
}

/// Patch is applied with "set fields" semantics to the first match only.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOneRequest {
    pub collection: String,
    pub filter: Filter,
    pub patch: Patch,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteOneRequest {
    pub collection: String,
    pub filter: Filter,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearRequest {
    pub collection: String,
}

/// Acknowledgment for every write: inserted, modified, or deleted count.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
