use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;

use log::{debug, trace};
use pingora::server::configuration::{Opt, ServerConf};
use pingora_error::{Error, ErrorType::*, OrErr, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "Config::validate_resource_names"))]
pub struct Config {
    #[serde(default)]
    pub pingora: ServerConf,

    #[validate(nested)]
    pub admin: Admin,
    pub status: Option<Status>,
    pub log: Option<Log>,

    #[validate(length(min = 1))]
    #[validate(nested)]
    pub resources: Vec<Resource>,
}

// Config file load and validation
impl Config {
    pub fn load_from_yaml<P>(path: P) -> Result<Self>
    where
        P: AsRef<std::path::Path> + std::fmt::Display,
    {
        let conf_str = fs::read_to_string(&path).or_err_with(ReadError, || {
            format!("Unable to read conf file from {path}")
        })?;
        debug!("Conf file read from {path}");
        Self::from_yaml(&conf_str)
    }

    // config file load entry point
    pub fn load_yaml_with_opt_override(opt: &Opt) -> Result<Self> {
        if let Some(path) = &opt.conf {
            let mut conf = Self::load_from_yaml(path)?;
            conf.merge_with_opt(opt);
            Ok(conf)
        } else {
            Error::e_explain(ReadError, "No path specified")
        }
    }

    pub fn from_yaml(conf_str: &str) -> Result<Self> {
        trace!("Read conf file: {conf_str}");
        let conf: Config = serde_yaml::from_str(conf_str).or_err_with(ReadError, || {
            format!("Unable to parse yaml conf {conf_str}")
        })?;

        trace!("Loaded conf: {conf:?}");

        conf.validate()
            .or_err_with(FileReadError, || "Conf file valid failed")?;

        Ok(conf)
    }

    pub fn merge_with_opt(&mut self, opt: &Opt) {
        if opt.daemon {
            self.pingora.daemon = true;
        }
    }

    fn validate_resource_names(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.name.as_str()) {
                let mut err = ValidationError::new("duplicate_resource_name");
                err.add_param("name".into(), &resource.name);
                return Err(err);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Admin {
    pub address: SocketAddr,
    #[serde(default = "Admin::default_prefix")]
    #[validate(custom(function = "Admin::validate_prefix"))]
    pub prefix: String,
}

impl Admin {
    fn default_prefix() -> String {
        "/admin".to_string()
    }

    fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
        if prefix.is_empty() || (prefix.starts_with('/') && !prefix.ends_with('/')) {
            Ok(())
        } else {
            Err(ValidationError::new("invalid_admin_prefix"))
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Status {
    pub address: SocketAddr,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log {
    pub path: String,
}

/// A retrievable resource type and its relation policy.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "Resource::validate_relations"))]
pub struct Resource {
    /// Path segment, e.g. `customers`.
    #[validate(length(min = 1), custom(function = "Resource::validate_name"))]
    pub name: String,
    /// Envelope key, e.g. `customer`.
    #[validate(length(min = 1))]
    pub key: String,
    #[validate(length(min = 1))]
    pub default_relations: Vec<String>,
    #[serde(default)]
    pub allowed_relations: Vec<String>,
    pub allowed_fields: Option<Vec<String>>,
    #[serde(default)]
    #[validate(custom(function = "Resource::validate_entities"))]
    pub entities: Vec<JsonValue>,
}

impl Resource {
    fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.contains('/') {
            let mut err = ValidationError::new("invalid_resource_name");
            err.add_param("name".into(), &name);
            return Err(err);
        }
        Ok(())
    }

    fn validate_relations(&self) -> Result<(), ValidationError> {
        for relation in &self.default_relations {
            if !self.allowed_relations.contains(relation) {
                let mut err = ValidationError::new("default_relation_not_allowed");
                err.add_param("relation".into(), relation);
                return Err(err);
            }
        }
        Ok(())
    }

    fn validate_entities(entities: &[JsonValue]) -> Result<(), ValidationError> {
        for entity in entities {
            match entity.get("id").and_then(JsonValue::as_str) {
                Some(id) if !id.is_empty() => {}
                _ => return Err(ValidationError::new("entity_id_required")),
            }
        }
        Ok(())
    }
}
