//! Find configuration for the retrieval collaborator
//!
//! `expand` and `fields` are comma separated. Entries are never trimmed or
//! deduplicated, and a blank value counts as absent. Existing clients depend
//! on this exact splitting, so keep it as is.

use std::sync::Arc;

use serde::Serialize;

use super::query::RetrievalRequest;

/// What the retriever should load for one request.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FindConfig {
    pub relations: Vec<String>,
    pub fields: Vec<String>,
}

/// Builds a [`FindConfig`] from a normalized request.
///
/// The default relation list belongs to the endpoint and is used whenever the
/// caller does not name any relations.
#[derive(Debug, Clone)]
pub struct FindConfigBuilder {
    default_relations: Arc<[String]>,
}

impl FindConfigBuilder {
    pub fn new<I, S>(default_relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_relations: default_relations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn build(&self, request: &RetrievalRequest) -> FindConfig {
        let relations = split_list(request.expand.as_deref())
            .unwrap_or_else(|| self.default_relations.to_vec());
        let fields = split_list(request.fields.as_deref()).unwrap_or_default();

        FindConfig { relations, fields }
    }
}

fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.split(',').map(str::to_string).collect())
}
