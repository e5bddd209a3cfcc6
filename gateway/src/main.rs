use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use gateway::{
    object_store::S3ObjectStore,
    server,
    types::{Environment, GatewayConfig},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set variables directly
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.default_log_filter()));

    // JSON logs for staging/production, regular format for development
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let config = GatewayConfig::from_env().inspect_err(|e| {
        tracing::error!("Invalid configuration: {e}");
    })?;
    tracing::debug!("Loaded configuration: {config:?}");

    let s3_client = Arc::new(S3Client::from_conf(config.s3_client_config().await));
    let store = Arc::new(S3ObjectStore::new(s3_client, config.bucket.clone()));

    server::start(config, store).await
}
