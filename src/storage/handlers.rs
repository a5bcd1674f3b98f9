//! Shard Node HTTP Handlers
//!
//! Serve a `MemoryStore` over the shard protocol. Used by the `shard_node`
//! binary; the router side is `RemoteStore`.

use axum::{Json, Router, extract::Extension, http::StatusCode, routing::get, routing::post};
use std::sync::Arc;

use super::memory::MemoryStore;
use super::protocol::*;
use super::store::ShardStore;
use crate::error::ClusterError;

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Builds the shard node's router.
pub fn shard_routes(store: Arc<MemoryStore>) -> Router {
    Router::new()
        .route(ENDPOINT_FIND, post(handle_find))
        .route(ENDPOINT_INSERT_MANY, post(handle_insert_many))
        .route(ENDPOINT_UPDATE_ONE, post(handle_update_one))
        .route(ENDPOINT_DELETE_ONE, post(handle_delete_one))
        .route(ENDPOINT_CLEAR, post(handle_clear))
        .route(ENDPOINT_COLLECTIONS, get(handle_collections))
        .route(ENDPOINT_PING, get(handle_ping))
        .layer(Extension(store))
}

pub async fn handle_find(
    Extension(store): Extension<Arc<MemoryStore>>,
    Json(req): Json<FindRequest>,
) -> HandlerResult<FindResponse> {
    let documents = store
        .find(&req.collection, &req.filter)
        .await
        .map_err(error_response)?;
    tracing::debug!(
        "find '{}' matched {} document(s)",
        req.collection,
        documents.len()
    );
    Ok(Json(FindResponse { documents }))
}

pub async fn handle_insert_many(
    Extension(store): Extension<Arc<MemoryStore>>,
    Json(req): Json<InsertManyRequest>,
) -> HandlerResult<CountResponse> {
    let count = store
        .insert_many(&req.collection, req.documents)
        .await
        .map_err(error_response)?;
    tracing::info!("Inserted {} document(s) into '{}'", count, req.collection);
    Ok(Json(CountResponse {
        count: count as u64,
    }))
}

pub async fn handle_update_one(
    Extension(store): Extension<Arc<MemoryStore>>,
    Json(req): Json<UpdateOneRequest>,
) -> HandlerResult<CountResponse> {
    let count = store
        .update_one(&req.collection, &req.filter, &req.patch)
        .await
        .map_err(error_response)?;
    Ok(Json(CountResponse { count }))
}

pub async fn handle_delete_one(
    Extension(store): Extension<Arc<MemoryStore>>,
    Json(req): Json<DeleteOneRequest>,
) -> HandlerResult<CountResponse> {
    let count = store
        .delete_one(&req.collection, &req.filter)
        .await
        .map_err(error_response)?;
    Ok(Json(CountResponse { count }))
}

pub async fn handle_clear(
    Extension(store): Extension<Arc<MemoryStore>>,
    Json(req): Json<ClearRequest>,
) -> HandlerResult<CountResponse> {
    let count = store.clear(&req.collection).await.map_err(error_response)?;
    tracing::info!("Cleared {} document(s) from '{}'", count, req.collection);
    Ok(Json(CountResponse { count }))
}

pub async fn handle_collections(
    Extension(store): Extension<Arc<MemoryStore>>,
) -> HandlerResult<CollectionsResponse> {
    let collections = store.list_collections().await.map_err(error_response)?;
    Ok(Json(CollectionsResponse {
        collections: collections.into_iter().collect(),
    }))
}

pub async fn handle_ping(Extension(store): Extension<Arc<MemoryStore>>) -> StatusCode {
    match store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(err: ClusterError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        ClusterError::MalformedFilter(_) => StatusCode::BAD_REQUEST,
        ClusterError::ShardUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!("Shard request failed: {}", err);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
