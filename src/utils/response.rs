//! Response building shared by the admin and status HTTP apps.

use http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;

use crate::core::ApiError;

/// Standard content types
pub mod content_type {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const APPLICATION_JSON: &str = "application/json";
}

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Build a response with the given status, body and content type.
    pub fn http(status: StatusCode, body: Vec<u8>, content_type: &'static str) -> Response<Vec<u8>> {
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)
            .unwrap_or_else(|e| {
                log::error!("Failed to build response: {}", e);
                let mut fallback = Response::new(b"Internal Server Error".to_vec());
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }

    /// Build a 200 response around an already serialized JSON body.
    pub fn success_json_body(body: Vec<u8>) -> Response<Vec<u8>> {
        Self::http(StatusCode::OK, body, content_type::APPLICATION_JSON)
    }

    /// Serialize `data` as JSON with the given status.
    pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Response<Vec<u8>> {
        match serde_json::to_vec(data) {
            Ok(body) => Self::http(status, body, content_type::APPLICATION_JSON),
            Err(e) => {
                log::error!("Failed to serialize JSON response: {}", e);
                Self::error_http(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "JSON serialization failed",
                )
            }
        }
    }

    /// Plain-text error response
    pub fn error_http(status: StatusCode, message: &str) -> Response<Vec<u8>> {
        Self::http(status, message.as_bytes().to_vec(), content_type::TEXT_PLAIN)
    }

    /// Map a pipeline error to its status code and JSON payload.
    pub fn api_error(err: &ApiError) -> Response<Vec<u8>> {
        Self::json(err.status_code(), &err.to_payload())
    }
}
