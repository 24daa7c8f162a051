//! Feedback submission endpoint

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::services::delivery::FeedbackRecord;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/v1/feedback", web::post().to(submit_feedback));
}

/// Feedback request payload
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub response_id: String,
    pub rating: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackAccepted {
    pub message_id: String,
}

/// Enqueue feedback on the feedback lane
///
/// POST /v1/feedback
pub async fn submit_feedback(
    state: web::Data<AppState>,
    payload: web::Json<FeedbackRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    if payload.response_id.trim().is_empty() {
        return Err(GatewayError::bad_request("response_id must not be empty"));
    }

    let message_id = state
        .dispatcher
        .submit_feedback(FeedbackRecord {
            response_id: payload.response_id.clone(),
            rating: payload.rating,
            created_at: chrono::Utc::now(),
        })
        .await?;
    info!(response_id = %payload.response_id, "Feedback queued");

    Ok(HttpResponse::Accepted().json(ApiResponse::success(FeedbackAccepted { message_id })))
}
