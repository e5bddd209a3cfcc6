//! Typed gateway configuration, read once at startup

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials;
use thiserror::Error;

use super::Environment;

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;
/// Default upload cap, 15 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;
/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const MAX_S3_RETRIES: u32 = 3;
const S3_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const CREDENTIALS_PROVIDER_NAME: &str = "gateway-config";

/// Errors raised while loading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but unusable
    #[error("Invalid {var}: {reason}")]
    Invalid {
        /// Name of the offending variable
        var: &'static str,
        /// What is wrong with its value
        reason: String,
    },
}

/// Everything the gateway needs to start
#[derive(Clone)]
pub struct GatewayConfig {
    /// Deployment stage
    pub environment: Environment,
    /// AWS access key id
    pub access_key_id: String,
    /// AWS secret access key
    pub secret_access_key: String,
    /// Bucket region
    pub region: String,
    /// Bucket name
    pub bucket: String,
    /// Listen port
    pub port: u16,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Explicit S3 endpoint, overriding the stage default
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("environment", &self.environment)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("port", &self.port)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("request_timeout", &self.request_timeout)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl GatewayConfig {
    /// Reads the configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first missing or invalid variable
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first missing or invalid variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let environment = Environment::parse(get("APP_ENV").as_deref())?;

        let access_key_id = get("AWS_ACCESS_KEY")
            .or_else(|| get("AWS_ACCESS_KEY_ID"))
            .ok_or(ConfigError::Missing("AWS_ACCESS_KEY"))?;
        // AWS_SECRETE_ACCESS_KEY is the name older deployments use
        let secret_access_key = get("AWS_SECRET_ACCESS_KEY")
            .or_else(|| get("AWS_SECRETE_ACCESS_KEY"))
            .ok_or(ConfigError::Missing("AWS_SECRET_ACCESS_KEY"))?;
        let region = require("BUCKET_REGION")?;
        let bucket = require("BUCKET_NAME")?;

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            get("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_UPLOAD_BYTES",
                reason: "must be greater than zero".to_string(),
            });
        }
        let request_timeout_secs: u64 = parse_or(
            "REQUEST_TIMEOUT_SECS",
            get("REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            environment,
            access_key_id,
            secret_access_key,
            region,
            bucket,
            port,
            max_upload_bytes,
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
            endpoint_url: get("S3_ENDPOINT_URL"),
        })
    }

    /// Endpoint the S3 client talks to, if not the regional AWS default
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url
            .as_deref()
            .or_else(|| self.environment.default_endpoint_url())
    }

    /// AWS configuration with static credentials, retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let credentials = Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_S3_RETRIES)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(S3_OPERATION_TIMEOUT)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.endpoint_url() {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Path-style addressing for LocalStack and other custom endpoints
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if self.endpoint_url().is_some() {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.map_or(Ok(default), |raw| {
        raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: format!("`{raw}`: {e}"),
        })
    })
}
