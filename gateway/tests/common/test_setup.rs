use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use gateway::{
    object_store::{InMemoryObjectStore, ObjectStore},
    server,
    types::GatewayConfig,
};
use tower::ServiceExt;

use super::utils::{multipart_content_type, test_config};

/// Setup test environment with tracing output
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Base test setup: full router over an in-memory bucket
pub struct TestSetup {
    pub router: Router,
    pub config: GatewayConfig,
    pub store: Arc<InMemoryObjectStore>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_max_upload_bytes(max_upload_bytes: usize) -> Self {
        Self::with_config(test_config(&[(
            "MAX_UPLOAD_BYTES",
            &max_upload_bytes.to_string(),
        )]))
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        setup_test_env();

        let store = Arc::new(InMemoryObjectStore::new(config.bucket.clone()).unwrap());
        let router = server::router(&config, store.clone());

        Self {
            router,
            config,
            store,
        }
    }

    pub async fn send_multipart(
        &self,
        route: &str,
        body: Vec<u8>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", multipart_content_type())
            .body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_json_request(
        &self,
        method: &str,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method(method)
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_json_request("POST", route, payload).await
    }

    pub async fn send_delete_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_json_request("DELETE", route, payload).await
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    /// Uploads `bytes` as `file_name` and returns the generated key
    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> String {
        let body = super::utils::image_form(file_name, Some("image/png"), bytes);
        let response = self
            .send_multipart("/api/post", body)
            .await
            .expect("Failed to send upload");
        assert_eq!(response.status(), http::StatusCode::OK);

        let body = super::utils::parse_response_body(response).await;
        body["imageUrl"].as_str().unwrap().to_string()
    }
}

/// Router over an arbitrary store, for fault-injection tests
pub fn router_with_store(store: Arc<dyn ObjectStore>) -> Router {
    router_with_store_and_config(store, &test_config(&[]))
}

pub fn router_with_store_and_config(store: Arc<dyn ObjectStore>, config: &GatewayConfig) -> Router {
    setup_test_env();
    server::router(config, store)
}
