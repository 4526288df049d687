//! Query normalization
//!
//! Raw query parameters are checked once against a declared schema and turned
//! into a typed [`RetrievalRequest`]. Nothing downstream looks at the raw
//! parameters again.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{map::Entry, Map, Value};
use validator::{Validate, ValidationErrors};

use super::error::{ApiError, ApiResult};

/// A typed set of recognized query parameters.
///
/// `FIELDS` lists every parameter name the schema accepts; anything else is
/// rejected before deserialization.
pub trait QuerySchema: DeserializeOwned + Validate {
    const FIELDS: &'static [&'static str];
}

/// Query parameters accepted by single-resource retrieval.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FindParams {
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl QuerySchema for FindParams {
    const FIELDS: &'static [&'static str] = &["expand", "fields"];
}

/// A normalized retrieval request.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct RetrievalRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub id: String,
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl RetrievalRequest {
    /// Validate `query` against [`FindParams`] and attach the path `id`.
    pub fn normalize(id: &str, query: &[(String, String)]) -> ApiResult<Self> {
        let params: FindParams = validate_query(query)?;
        let request = RetrievalRequest {
            id: id.to_string(),
            expand: params.expand,
            fields: params.fields,
        };
        request.validate().map_err(first_violation)?;
        Ok(request)
    }
}

/// Check raw `(name, value)` pairs against schema `S`.
///
/// A parameter given more than once arrives as a list, which fails the
/// string type check of every declared field.
pub fn validate_query<S: QuerySchema>(query: &[(String, String)]) -> ApiResult<S> {
    let mut object = Map::new();
    for (name, value) in query {
        if !S::FIELDS.contains(&name.as_str()) {
            return Err(ApiError::validation(
                name,
                format!("property {name} should not exist"),
            ));
        }
        match object.entry(name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Value::String(value.clone()));
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(values) => values.push(Value::String(value.clone())),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value.clone())]);
                }
            },
        }
    }

    if let Some((name, _)) = object.iter().find(|(_, v)| !v.is_string()) {
        return Err(ApiError::validation(name, format!("{name} must be a string")));
    }

    let schema: S = serde_json::from_value(Value::Object(object))
        .map_err(|e| ApiError::validation("query", e.to_string()))?;
    schema.validate().map_err(first_violation)?;
    Ok(schema)
}

/// Collapse validator output to the first offending field, by name.
fn first_violation(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    match fields.first() {
        Some((field, violations)) => {
            let message = violations
                .first()
                .map(|v| {
                    v.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| v.code.to_string())
                })
                .unwrap_or_else(|| "is invalid".to_string());
            ApiError::validation(field.to_string(), message)
        }
        None => ApiError::validation("query", errors.to_string()),
    }
}
