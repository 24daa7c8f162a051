//! HTTP response handling for errors

use super::types::GatewayError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

/// Header flagging a response that was produced by the gateway itself
pub const ERROR_HEADER: &str = "x-meter-error";

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_)
            | GatewayError::Parsing(_)
            | GatewayError::Serialization(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            GatewayError::Upstream(_) | GatewayError::HttpClient(_) | GatewayError::Network(_) => {
                ("UPSTREAM_ERROR", self.to_string())
            }
            GatewayError::DeadlineExceeded(_) => ("DEADLINE_EXCEEDED", self.to_string()),
            GatewayError::Config(_) => ("CONFIG_ERROR", self.to_string()),
            GatewayError::Database(_) => (
                "DATABASE_ERROR",
                "Database operation failed".to_string(),
            ),
            #[cfg(feature = "redis")]
            GatewayError::Redis(_) => ("CACHE_ERROR", "Cache operation failed".to_string()),
            GatewayError::BadRequest(_) => ("BAD_REQUEST", self.to_string()),
            GatewayError::Parsing(_) | GatewayError::Serialization(_) => {
                ("PARSING_ERROR", self.to_string())
            }
            GatewayError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            _ => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
                request_id: None,
            },
            support: SUPPORT_MESSAGE.to_string(),
        };

        HttpResponse::build(self.status_code())
            .insert_header((ERROR_HEADER, "true"))
            .json(error_response)
    }
}

const SUPPORT_MESSAGE: &str =
    "The request could not be forwarded. Retry the call or contact the gateway operator.";

/// Standard error response format
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub support: String,
}

/// Error detail information
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}
