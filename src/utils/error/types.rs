//! Core error type definitions

use thiserror::Error;

/// Result type alias for the Gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the Gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream provider failed (network failure or exhausted retries)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Client went away before the response finished
    #[error("Client aborted: {0}")]
    ClientAbort(String),

    /// Externally owned deadline fired
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Fallback pointer resolved to nothing
    #[error("Missing payload: {0}")]
    MissingPayload(String),

    /// A whole queue batch could not be applied
    #[error("Batch apply error: {0}")]
    BatchApply(String),

    /// A deferred log field failed to compute
    #[error("Logging error: {0}")]
    Logging(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Network errors
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}
