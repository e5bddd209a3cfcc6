mod config;
mod environment;
mod error;
mod extractors;

pub use config::{
    ConfigError, GatewayConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
pub use extractors::ValidatedJson;
