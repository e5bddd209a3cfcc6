mod common;

use common::*;

use axum::{body::Body, http::Request};
use http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/api/unknown").await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "route not found");
    assert_eq!(body["code"], "route_not_found");
}

#[tokio::test]
async fn test_wrong_method_returns_404() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/api/post").await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = setup
        .send_post_request("/api/deleteImage", json!({ "imageName": "a.png" }))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "route not found");
}

#[tokio::test]
async fn test_health() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/health").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["semver"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let setup = TestSetup::new();

    let request = Request::builder()
        .uri("/api/deleteImage")
        .method("OPTIONS")
        .header("Origin", "https://photos.example.com")
        .header("Access-Control-Request-Method", "DELETE")
        .body(Body::empty())
        .unwrap();
    let response = setup.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
    let methods = response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("DELETE"));
}
