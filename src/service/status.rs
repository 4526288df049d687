use async_trait::async_trait;
use http::{Response, StatusCode};
use pingora::{
    apps::http_app::ServeHttp, protocols::http::ServerSession, services::listening::Service,
};
use serde::Serialize;

use crate::{config::Status, core::status, utils::response::ResponseBuilder};

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// HTTP application for the readiness probe.
///
/// `/status/ready` answers 200 `{"status": "ok"}` once the resource stores are
/// seeded and 503 with an error message before that. Anything else is 404.
pub struct StatusHttpApp {
    config: Status,
}

impl StatusHttpApp {
    pub fn new(cfg: &Status) -> Self {
        Self {
            config: cfg.clone(),
        }
    }

    pub fn status_http_service(cfg: &Status) -> Service<Self> {
        let app = Self::new(cfg);
        let addr = &app.config.address.to_string();
        let mut service = Service::new("Status HTTP".to_string(), app);
        service.add_tcp(addr);
        service
    }
}

#[async_trait]
impl ServeHttp for StatusHttpApp {
    async fn response(&self, http_session: &mut ServerSession) -> Response<Vec<u8>> {
        http_session.set_keepalive(None);
        route(http_session.req_header().uri.path())
    }
}

fn route(path: &str) -> Response<Vec<u8>> {
    match path {
        "/status/ready" => handle_ready_endpoint(),
        _ => ResponseBuilder::error_http(StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn handle_ready_endpoint() -> Response<Vec<u8>> {
    if status::is_ready() {
        let response = StatusResponse {
            status: "ok".to_string(),
            error: None,
        };
        ResponseBuilder::json(StatusCode::OK, &response)
    } else {
        let response = StatusResponse {
            status: "error".to_string(),
            error: Some("Resources not loaded yet".to_string()),
        };
        ResponseBuilder::json(StatusCode::SERVICE_UNAVAILABLE, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::tests::TEST_LOCK;

    #[test]
    fn test_ready_endpoint() {
        let _guard = TEST_LOCK.lock().unwrap();
        status::reset();
        let resp = route("/status/ready");
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.body(),
            br#"{"status":"error","error":"Resources not loaded yet"}"#
        );

        status::mark_ready(1);
        let resp = route("/status/ready");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), br#"{"status":"ok"}"#);
        status::reset();
    }

    #[test]
    fn test_unknown_path() {
        assert_eq!(route("/status/live").status(), StatusCode::NOT_FOUND);
    }
}
