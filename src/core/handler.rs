//! Single-resource retrieval pipeline
//!
//! raw query -> [`RetrievalRequest`] -> [`FindConfig`] -> retriever -> [`ResourceEnvelope`]

use std::sync::Arc;

use async_trait::async_trait;
use serde::{ser::SerializeMap, Serialize, Serializer};

use super::{
    error::ApiResult,
    find::FindConfigBuilder,
    query::RetrievalRequest,
    traits::{EntityRetriever, ResourceEndpoint},
};

/// Response body holding one entity under its resource name,
/// e.g. `{"customer": {...}}`.
#[derive(Debug)]
pub struct ResourceEnvelope<T> {
    key: String,
    entity: T,
}

impl<T> ResourceEnvelope<T> {
    pub fn new(key: impl Into<String>, entity: T) -> Self {
        Self {
            key: key.into(),
            entity,
        }
    }
}

impl<T: Serialize> Serialize for ResourceEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.entity)?;
        map.end()
    }
}

/// Retrieval handler for one resource type.
///
/// The retriever is injected at construction; the handler keeps no per-request
/// state and can be shared across concurrent requests.
pub struct RetrieveHandler<R> {
    key: String,
    builder: FindConfigBuilder,
    retriever: Arc<R>,
}

impl<R: EntityRetriever> RetrieveHandler<R> {
    pub fn new(key: impl Into<String>, builder: FindConfigBuilder, retriever: Arc<R>) -> Self {
        Self {
            key: key.into(),
            builder,
            retriever,
        }
    }

    /// Run the pipeline for one request. Every error propagates unchanged.
    pub async fn handle(
        &self,
        id: &str,
        query: &[(String, String)],
    ) -> ApiResult<ResourceEnvelope<R::Entity>> {
        let request = RetrievalRequest::normalize(id, query)?;
        let config = self.builder.build(&request);
        log::debug!(
            "Retrieving {} {} with relations {:?} and fields {:?}",
            self.key,
            request.id,
            config.relations,
            config.fields
        );

        let entity = self.retriever.retrieve(&request.id, config).await?;
        Ok(ResourceEnvelope::new(self.key.as_str(), entity))
    }
}

#[async_trait]
impl<R: EntityRetriever> ResourceEndpoint for RetrieveHandler<R> {
    fn key(&self) -> &str {
        &self.key
    }

    async fn respond(&self, id: &str, query: &[(String, String)]) -> ApiResult<Vec<u8>> {
        let envelope = self.handle(id, query).await?;
        Ok(serde_json::to_vec(&envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::core::{error::ApiError, find::FindConfig};

    /// Records every call and answers with a fixed entity or a not-found error.
    struct SpyRetriever {
        calls: Mutex<Vec<(String, FindConfig)>>,
        entity: Option<Value>,
    }

    impl SpyRetriever {
        fn returning(entity: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                entity: Some(entity),
            })
        }

        fn missing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                entity: None,
            })
        }

        fn calls(&self) -> Vec<(String, FindConfig)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntityRetriever for SpyRetriever {
        type Entity = Value;

        async fn retrieve(&self, id: &str, config: FindConfig) -> ApiResult<Value> {
            self.calls.lock().unwrap().push((id.to_string(), config));
            self.entity
                .clone()
                .ok_or_else(|| ApiError::NotFound(format!("customer with id {id}")))
        }
    }

    fn handler(retriever: Arc<SpyRetriever>) -> RetrieveHandler<SpyRetriever> {
        RetrieveHandler::new(
            "customer",
            FindConfigBuilder::new(["orders", "shipping_addresses"]),
            retriever,
        )
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_expand_passed_to_retriever() {
        let spy = SpyRetriever::returning(json!({"id": "cus_1", "email": "a@b.c"}));
        let handler = handler(spy.clone());

        let envelope = handler
            .handle("cus_1", &pairs(&[("expand", "orders,addresses")]))
            .await
            .unwrap();

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "cus_1");
        assert_eq!(calls[0].1.relations, vec!["orders", "addresses"]);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"customer": {"id": "cus_1", "email": "a@b.c"}})
        );
    }

    #[tokio::test]
    async fn test_no_query_uses_default_relations() {
        let spy = SpyRetriever::returning(json!({"id": "cus_1"}));
        handler(spy.clone()).handle("cus_1", &[]).await.unwrap();

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1,
            FindConfig {
                relations: vec!["orders".to_string(), "shipping_addresses".to_string()],
                fields: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_empty_expand_uses_default_relations() {
        let spy = SpyRetriever::returning(json!({"id": "cus_1"}));
        handler(spy.clone())
            .handle("cus_1", &pairs(&[("expand", "")]))
            .await
            .unwrap();

        assert_eq!(spy.calls()[0].1.relations, vec!["orders", "shipping_addresses"]);
    }

    #[tokio::test]
    async fn test_unexpected_param_never_reaches_retriever() {
        let spy = SpyRetriever::returning(json!({"id": "cus_1"}));
        let err = handler(spy.clone())
            .handle("cus_1", &pairs(&[("foo", "bar")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(spy.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let spy = SpyRetriever::missing();
        let err = handler(spy.clone())
            .respond("cus_404", &[])
            .await
            .unwrap_err();

        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "customer with id cus_404"),
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(spy.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_respond_serializes_envelope() {
        let spy = SpyRetriever::returning(json!({"id": "cus_1"}));
        let body = handler(spy).respond("cus_1", &[]).await.unwrap();
        assert_eq!(body, br#"{"customer":{"id":"cus_1"}}"#.to_vec());
    }
}
