//! In-memory entity store
//!
//! [`MemoryRetriever`] serves entities seeded from configuration and enforces
//! the relation and field policy of its resource.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::{
    config::Resource,
    config_error,
    core::{ApiError, ApiResult, EntityRetriever, FindConfig},
    not_found,
};

pub struct MemoryRetriever {
    resource: String,
    entities: DashMap<String, Value>,
    allowed_relations: HashSet<String>,
    allowed_fields: Option<HashSet<String>>,
}

impl MemoryRetriever {
    pub fn new<I, S>(resource: &str, allowed_relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: resource.to_string(),
            entities: DashMap::new(),
            allowed_relations: allowed_relations.into_iter().map(Into::into).collect(),
            allowed_fields: None,
        }
    }

    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Build a store for `resource` and seed it with the configured entities.
    pub fn from_config(resource: &Resource) -> ApiResult<Self> {
        let mut store = Self::new(&resource.name, resource.allowed_relations.iter().cloned());
        if let Some(fields) = &resource.allowed_fields {
            store = store.with_allowed_fields(fields.iter().cloned());
        }
        for entity in &resource.entities {
            store.insert(entity.clone())?;
        }
        debug!(
            "Seeded {} {} entities",
            store.len(),
            resource.name
        );
        Ok(store)
    }

    /// Insert or replace an entity keyed by its string `id`.
    pub fn insert(&self, entity: Value) -> ApiResult<()> {
        let id = entity
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| config_error!("{} entity without a string id", self.resource))?;
        if self.entities.insert(id.clone(), entity).is_some() {
            warn!("Replaced {} entity {}", self.resource, id);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn check_policy(&self, config: &FindConfig) -> ApiResult<()> {
        if let Some(relation) = config
            .relations
            .iter()
            .find(|r| !self.allowed_relations.contains(r.as_str()))
        {
            return Err(ApiError::Forbidden(format!(
                "relation {relation} is not allowed on {}",
                self.resource
            )));
        }
        if let Some(allowed) = &self.allowed_fields {
            if let Some(field) = config.fields.iter().find(|f| !allowed.contains(f.as_str())) {
                return Err(ApiError::Forbidden(format!(
                    "field {field} is not allowed on {}",
                    self.resource
                )));
            }
        }
        Ok(())
    }

    /// Drop relations that were not asked for, then apply field selection.
    fn shape(&self, entity: Value, config: &FindConfig) -> Value {
        let mut object = match entity {
            Value::Object(object) => object,
            other => return other,
        };

        object.retain(|key, _| {
            !self.allowed_relations.contains(key) || config.relations.iter().any(|r| r == key)
        });

        if config.fields.is_empty() {
            return Value::Object(object);
        }

        let selected: Map<String, Value> = object
            .into_iter()
            .filter(|(key, _)| {
                key == "id"
                    || config.fields.iter().any(|f| f == key)
                    || config.relations.iter().any(|r| r == key)
            })
            .collect();
        Value::Object(selected)
    }
}

#[async_trait]
impl EntityRetriever for MemoryRetriever {
    type Entity = Value;

    async fn retrieve(&self, id: &str, config: FindConfig) -> ApiResult<Value> {
        self.check_policy(&config)?;

        let entity = self
            .entities
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found!("{} with id {} was not found", self.resource, id))?;

        Ok(self.shape(entity, &config))
    }
}
