use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;
use crate::types::AppError;

/// Health check route
pub mod health;
/// Upload, read-link and delete routes
pub mod images;

/// Responds to any unmatched path or method
pub async fn route_not_found() -> AppError {
    AppError::route_not_found()
}

/// Creates the router with all handler routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/post",
            post(images::upload_image).fallback(route_not_found),
        )
        .route(
            "/api/get",
            post(images::issue_read_link).fallback(route_not_found),
        )
        .route(
            "/api/deleteImage",
            delete(images::delete_image).fallback(route_not_found),
        )
        .route("/health", get(health::handler))
        .fallback(route_not_found)
}
