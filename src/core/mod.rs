//! Core request pipeline for single-resource retrieval
//!
//! Query normalization, find-configuration building, the retriever seam and
//! the response envelope live here. Nothing in this module touches HTTP I/O.

pub mod error;
pub mod find;
pub mod handler;
pub mod query;
pub mod status;
pub mod traits;

pub use error::{ApiError, ApiResult};
pub use find::{FindConfig, FindConfigBuilder};
pub use handler::{ResourceEnvelope, RetrieveHandler};
pub use query::{FindParams, QuerySchema, RetrievalRequest};
pub use traits::*;
