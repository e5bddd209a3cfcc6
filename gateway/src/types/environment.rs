//! Environment configuration for different deployment stages

use std::env;

use super::config::ConfigError;

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `APP_ENV` holds an unknown stage
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(env::var("APP_ENV").ok().as_deref())
    }

    /// Parses a stage name, defaulting to production when unset
    ///
    /// Development, and with it the `LocalStack` endpoint, must be asked for
    /// explicitly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for anything other than
    /// `production`, `staging` or `development`
    pub fn parse(value: Option<&str>) -> Result<Self, ConfigError> {
        let stage = value.unwrap_or("production").trim().to_lowercase();

        match stage.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(ConfigError::Invalid {
                var: "APP_ENV",
                reason: format!("unknown environment `{stage}`"),
            }),
        }
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Log filter used when `RUST_LOG` is not set
    #[must_use]
    pub const fn default_log_filter(self) -> &'static str {
        match self {
            Self::Production | Self::Staging => "info",
            Self::Development => "debug",
        }
    }

    /// Returns the endpoint URL to use for S3 when none is configured
    #[must_use]
    pub const fn default_endpoint_url(self) -> Option<&'static str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }
}
