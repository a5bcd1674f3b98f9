use super::protocol::*;
use super::store::ShardStore;
use crate::config::ShardEndpoint;
use crate::document::filter::{Filter, Patch};
use crate::document::types::Document;
use crate::error::{ClusterError, Result};
use crate::partition::types::ShardId;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::time::Duration;

/// HTTP client for one shard node.
///
/// Every call is a single request bounded by `timeout`. Transport failures
/// and non-success responses surface as `ShardUnavailable` for this shard;
/// there is no retry loop here.
pub struct RemoteStore {
    shard: ShardId,
    base_url: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl RemoteStore {
    pub fn new(shard: ShardId, endpoint: &ShardEndpoint, timeout: Duration) -> Self {
        Self::with_base_url(shard, endpoint.base_url(), timeout)
    }

    pub fn with_base_url(shard: ShardId, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            shard,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<R> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClusterError::unavailable(self.shard, e))?;
        self.decode(endpoint, response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, endpoint))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClusterError::unavailable(self.shard, e))?;
        self.decode(endpoint, response).await
    }

    async fn decode<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<R> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| ClusterError::unavailable(self.shard, e));
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(ClusterError::MalformedFilter(message));
        }
        Err(ClusterError::unavailable(
            self.shard,
            format!("{endpoint} returned {status}: {message}"),
        ))
    }
}

impl ShardStore for RemoteStore {
    fn shard(&self) -> ShardId {
        self.shard
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let payload = FindRequest {
            collection: collection.to_string(),
            filter: filter.clone(),
        };
        let response: FindResponse = self.post_json(ENDPOINT_FIND, &payload).await?;
        Ok(response.documents)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        let payload = InsertManyRequest {
            collection: collection.to_string(),
            documents,
        };
        let response: CountResponse = self.post_json(ENDPOINT_INSERT_MANY, &payload).await?;
        Ok(response.count as usize)
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64> {
        let payload = UpdateOneRequest {
            collection: collection.to_string(),
            filter: filter.clone(),
            patch: patch.clone(),
        };
        let response: CountResponse = self.post_json(ENDPOINT_UPDATE_ONE, &payload).await?;
        Ok(response.count)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let payload = DeleteOneRequest {
            collection: collection.to_string(),
            filter: filter.clone(),
        };
        let response: CountResponse = self.post_json(ENDPOINT_DELETE_ONE, &payload).await?;
        Ok(response.count)
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        let payload = ClearRequest {
            collection: collection.to_string(),
        };
        let response: CountResponse = self.post_json(ENDPOINT_CLEAR, &payload).await?;
        Ok(response.count)
    }

    async fn list_collections(&self) -> Result<BTreeSet<String>> {
        let response: CollectionsResponse = self.get_json(ENDPOINT_COLLECTIONS).await?;
        Ok(response.collections.into_iter().collect())
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, ENDPOINT_PING))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClusterError::unavailable(self.shard, e))?;
        if !response.status().is_success() {
            return Err(ClusterError::unavailable(
                self.shard,
                format!("ping returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
