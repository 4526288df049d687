//! Single-resource retrieval API.
//!
//! `GET {prefix}/{resource}/{id}?expand=..&fields=..` is validated, turned into
//! a find configuration and answered with `{"<resource>": <entity>}`.

pub mod admin;
pub mod config;
pub mod core;
pub mod logging;
pub mod service;
pub mod store;
pub(crate) mod utils;
