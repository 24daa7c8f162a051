//! Health check endpoint

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Health status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: Cow<'static, str>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: Cow<'static, str>,
    /// Warehouse backend, `None` when records stay in memory
    pub database: Option<Cow<'static, str>>,
    pub queue: Cow<'static, str>,
}

/// Reports `healthy` when every configured backend answers, `degraded`
/// with 503 otherwise
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    debug!("Health check requested");

    let healthy = match state.storage.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            false
        }
    };

    let queue = if state.config.storage().redis.enabled {
        "redis"
    } else {
        "memory"
    };

    let status = HealthStatus {
        status: Cow::Borrowed(if healthy { "healthy" } else { "degraded" }),
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        database: state
            .storage
            .database
            .as_ref()
            .map(|db| Cow::Borrowed(db.backend_type().as_str())),
        queue: Cow::Borrowed(queue),
    };

    if healthy {
        HttpResponse::Ok().json(ApiResponse::success(status))
    } else {
        HttpResponse::ServiceUnavailable().json(ApiResponse::success(status))
    }
}
