//! Helper functions for creating specific error types

use super::types::GatewayError;

/// Helper functions for creating specific errors
impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream(message.into())
    }

    pub fn client_abort<S: Into<String>>(message: S) -> Self {
        Self::ClientAbort(message.into())
    }

    pub fn deadline_exceeded<S: Into<String>>(message: S) -> Self {
        Self::DeadlineExceeded(message.into())
    }

    pub fn missing_payload<S: Into<String>>(key: S) -> Self {
        Self::MissingPayload(key.into())
    }

    pub fn batch_apply<S: Into<String>>(message: S) -> Self {
        Self::BatchApply(message.into())
    }

    pub fn logging<S: Into<String>>(message: S) -> Self {
        Self::Logging(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    pub fn parsing<S: Into<String>>(message: S) -> Self {
        Self::Parsing(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the failure is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Upstream(_) | GatewayError::Network(_) => true,
            GatewayError::HttpClient(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            GatewayError::BatchApply(_) | GatewayError::Database(_) => true,
            #[cfg(feature = "redis")]
            GatewayError::Redis(_) => true,
            _ => false,
        }
    }
}
