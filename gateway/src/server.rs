use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers;
use crate::object_store::ObjectStore;
use crate::state::AppState;
use crate::types::{AppError, GatewayConfig};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Builds the full application router with middleware
#[must_use]
pub fn router(config: &GatewayConfig, store: Arc<dyn ObjectStore>) -> Router {
    let state = AppState::new(store, config.max_upload_bytes);

    // Wildcard origins cannot be combined with credentials
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any);

    handlers::routes()
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(middleware::map_response(timeout_envelope))
        .with_state(state)
}

/// Gives the bare 408 from `TimeoutLayer` the JSON error body
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        AppError::request_timeout().into_response()
    } else {
        response
    }
}

/// Starts the server with the given configuration and object store
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(config: GatewayConfig, store: Arc<dyn ObjectStore>) -> anyhow::Result<()> {
    let app = router(&config, store);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "Image gateway started on http://{addr} (bucket: {}, region: {})",
        config.bucket,
        config.region
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, draining connections");
}
