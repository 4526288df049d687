use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use http::{Method, Response, StatusCode};
use matchit::{Match, Router};
use pingora::{
    apps::http_app::ServeHttp, protocols::http::ServerSession, services::listening::Service,
};

use crate::{
    config::{Admin, Config},
    config_error,
    core::{ApiError, ApiResult, FindConfigBuilder, ResourceEndpoint, RetrieveHandler},
    not_found,
    store::MemoryRetriever,
    utils::{request::parse_query, response::ResponseBuilder},
};

type ResourceTable = HashMap<String, Arc<dyn ResourceEndpoint>>;

#[async_trait]
trait Handler {
    async fn handle(
        &self,
        resources: &ResourceTable,
        params: BTreeMap<String, String>,
        query: Option<&str>,
    ) -> ApiResult<Response<Vec<u8>>>;
}

/// Admin HTTP application serving `GET {prefix}/{resource}/{id}`.
pub struct AdminHttpApp {
    resources: ResourceTable,
    router: Router<HashMap<Method, Box<dyn Handler + Send + Sync>>>,

    config: Admin,
}

impl AdminHttpApp {
    pub fn new(cfg: &Admin) -> ApiResult<Self> {
        let mut this = Self {
            resources: HashMap::new(),
            router: Router::new(),
            config: cfg.clone(),
        };

        let path = format!("{}/{{resource}}/{{id}}", cfg.prefix);
        this.route(&path, Method::GET, Box::new(ResourceGetHandler {}))?;

        Ok(this)
    }

    /// Build the app with one in-memory retriever per configured resource.
    pub fn from_config(cfg: &Config) -> ApiResult<Self> {
        let mut this = Self::new(&cfg.admin)?;
        for resource in &cfg.resources {
            let retriever = Arc::new(MemoryRetriever::from_config(resource)?);
            let handler = RetrieveHandler::new(
                resource.key.as_str(),
                FindConfigBuilder::new(resource.default_relations.iter().cloned()),
                retriever,
            );
            this.register(&resource.name, Arc::new(handler));
        }
        Ok(this)
    }

    /// Expose `endpoint` under the path segment `name`.
    pub fn register(&mut self, name: &str, endpoint: Arc<dyn ResourceEndpoint>) -> &mut Self {
        log::info!("Registering resource {} as '{}'", name, endpoint.key());
        self.resources.insert(name.to_string(), endpoint);
        self
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    fn route(
        &mut self,
        path: &str,
        method: Method,
        handler: Box<dyn Handler + Send + Sync>,
    ) -> ApiResult<&mut Self> {
        match self.router.at_mut(path) {
            Ok(routes) => {
                routes.value.insert(method, handler);
            }
            Err(_) => {
                let mut handlers = HashMap::new();
                handlers.insert(method, handler);
                self.router
                    .insert(path, handlers)
                    .map_err(|e| config_error!("Invalid admin route {}: {}", path, e))?;
            }
        }
        Ok(self)
    }

    pub fn admin_http_service(self) -> Service<Self> {
        let addr = self.config.address.to_string();
        let mut service = Service::new("Admin HTTP".to_string(), self);
        service.add_tcp(&addr);
        service
    }

    /// Route one request and turn any error into its HTTP response.
    pub async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
    ) -> Response<Vec<u8>> {
        match self.router.at(path) {
            Ok(Match { value, params }) => match value.get(method) {
                Some(handler) => {
                    let params: BTreeMap<String, String> = params
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();
                    match handler.handle(&self.resources, params, query).await {
                        Ok(resp) => resp,
                        Err(e) => {
                            if e.status_code().is_server_error() {
                                log::error!("{method} {path} failed: {e}");
                            } else {
                                log::warn!("{method} {path} rejected: {e}");
                            }
                            ResponseBuilder::api_error(&e)
                        }
                    }
                }
                None => ResponseBuilder::error_http(StatusCode::METHOD_NOT_ALLOWED, ""),
            },
            Err(_) => ResponseBuilder::error_http(StatusCode::NOT_FOUND, "Not Found"),
        }
    }
}

#[async_trait]
impl ServeHttp for AdminHttpApp {
    async fn response(&self, http_session: &mut ServerSession) -> Response<Vec<u8>> {
        http_session.set_keepalive(None);

        let (method, path, query) = {
            let req_header = http_session.req_header();
            (
                req_header.method.clone(),
                req_header.uri.path().to_string(),
                req_header.uri.query().map(str::to_string),
            )
        };

        self.dispatch(&method, &path, query.as_deref()).await
    }
}

struct ResourceGetHandler;

#[async_trait]
impl Handler for ResourceGetHandler {
    async fn handle(
        &self,
        resources: &ResourceTable,
        params: BTreeMap<String, String>,
        query: Option<&str>,
    ) -> ApiResult<Response<Vec<u8>>> {
        let resource = params
            .get("resource")
            .ok_or_else(|| ApiError::Internal("Missing resource type".to_string()))?;
        let id = params
            .get("id")
            .ok_or_else(|| ApiError::Internal("Missing resource ID".to_string()))?;
        let id = urlencoding::decode(id)
            .map_err(|e| ApiError::validation("id", format!("id is not valid UTF-8: {e}")))?;

        let endpoint = resources
            .get(resource)
            .ok_or_else(|| not_found!("Unsupported resource type {}", resource))?;

        let body = endpoint.respond(&id, &parse_query(query)).await?;
        Ok(ResponseBuilder::success_json_body(body))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn app() -> AdminHttpApp {
        let conf = Config::from_yaml(
            r#"
admin:
  address: 127.0.0.1:9180
resources:
  - name: customers
    key: customer
    default_relations: [orders, shipping_addresses]
    allowed_relations: [orders, shipping_addresses, groups]
    entities:
      - id: cus_1
        email: jane@example.com
        orders: [{id: order_1}]
        shipping_addresses: [{id: addr_1}]
        groups: [{id: vip}]
      - id: "cus 2/ø"
        email: encoded@example.com
            "#,
        )
        .unwrap();
        AdminHttpApp::from_config(&conf).unwrap()
    }

    fn body(resp: &Response<Vec<u8>>) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn test_get_with_default_relations() {
        let app = app();
        assert_eq!(app.resource_count(), 1);

        let resp = app
            .dispatch(&Method::GET, "/admin/customers/cus_1", None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body(&resp),
            json!({"customer": {
                "id": "cus_1",
                "email": "jane@example.com",
                "orders": [{"id": "order_1"}],
                "shipping_addresses": [{"id": "addr_1"}]
            }})
        );
    }

    #[tokio::test]
    async fn test_get_with_expand_and_fields() {
        let resp = app()
            .dispatch(
                &Method::GET,
                "/admin/customers/cus_1",
                Some("expand=groups&fields=email"),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body(&resp),
            json!({"customer": {
                "id": "cus_1",
                "email": "jane@example.com",
                "groups": [{"id": "vip"}]
            }})
        );
    }

    #[tokio::test]
    async fn test_unexpected_param_is_bad_request() {
        let resp = app()
            .dispatch(&Method::GET, "/admin/customers/cus_1", Some("foo=bar"))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&resp)["field"], "foo");
    }

    #[tokio::test]
    async fn test_unknown_relation_is_bad_request() {
        let resp = app()
            .dispatch(&Method::GET, "/admin/customers/cus_1", Some("expand=secrets"))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&resp)["error"], "not_allowed");
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_found() {
        let resp = app()
            .dispatch(&Method::GET, "/admin/customers/cus_404", None)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&resp)["error"], "not_found");
    }

    #[tokio::test]
    async fn test_unknown_resource_and_path() {
        let app = app();
        let resp = app.dispatch(&Method::GET, "/admin/orders/order_1", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app.dispatch(&Method::GET, "/other", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_decodes_path_id() {
        let resp = app()
            .dispatch(
                &Method::GET,
                "/admin/customers/cus%202%2F%C3%B8",
                Some("fields=email"),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body(&resp),
            json!({"customer": {"id": "cus 2/ø", "email": "encoded@example.com"}})
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_id_is_bad_request() {
        let resp = app()
            .dispatch(&Method::GET, "/admin/customers/cus%FF", None)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&resp)["field"], "id");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let resp = app()
            .dispatch(&Method::DELETE, "/admin/customers/cus_1", None)
            .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
