//! Core traits for the retrieval API
//!
//! These are the seams between the request pipeline, the data-access layer,
//! and the HTTP front end.

use async_trait::async_trait;
use serde::Serialize;

use super::{error::ApiResult, find::FindConfig};

/// Data-access collaborator that loads a single entity.
///
/// Implementations own the storage policy: they fail with
/// [`ApiError::NotFound`](super::error::ApiError::NotFound) for an unknown id
/// and may fail with [`ApiError::Forbidden`](super::error::ApiError::Forbidden)
/// for relations or fields they refuse to load.
#[async_trait]
pub trait EntityRetriever: Send + Sync {
    type Entity: Serialize + Send;

    async fn retrieve(&self, id: &str, config: FindConfig) -> ApiResult<Self::Entity>;
}

/// A retrieval endpoint as seen by the router: path id and raw query in,
/// serialized response body out.
#[async_trait]
pub trait ResourceEndpoint: Send + Sync {
    /// Logical resource name used as the envelope key.
    fn key(&self) -> &str;

    async fn respond(&self, id: &str, query: &[(String, String)]) -> ApiResult<Vec<u8>>;
}
