//! Provider proxy route
//!
//! `ANY /{provider}/{path..}` is forwarded to the provider's base URL. The
//! response streams straight back to the client while a detached task waits
//! for the stream outcome and hands the finished records to the queue.

use crate::core::loggable::{Loggable, coerce_status};
use crate::core::proxy::{InboundCall, StreamInterceptor, build_proxy_request, handle_proxy_request};
use crate::server::state::AppState;
use crate::services::delivery::LogDispatcher;
use crate::services::pricing::PricingService;
use crate::utils::error::{GatewayError, Result};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, error, info_span, warn};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{provider}/{path:.*}", web::route().to(proxy));
}

/// Forward one call
pub async fn proxy(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (provider_name, rest) = path.into_inner();
    let provider = state
        .config
        .gateway
        .get_provider(&provider_name)
        .filter(|p| p.enabled)
        .ok_or_else(|| GatewayError::not_found(format!("Unknown provider: {}", provider_name)))?;

    let call = InboundCall {
        method: convert_method(req.method())?,
        path: rest,
        query: Some(req.query_string().to_string()),
        headers: convert_headers(req.headers()),
        body,
    };
    let request = build_proxy_request(provider, call, &state.config.server().retry_limits)?;
    let request_id = request.id.clone();
    debug!(
        request_id = %request_id,
        provider = %request.provider,
        target = %request.target_url,
        is_stream = request.is_stream,
        "Forwarding request"
    );

    let result = handle_proxy_request(&state.forwarder, request)
        .await
        .inspect_err(|e| warn!(request_id = %request_id, "Forwarding failed: {}", e))?;

    spawn_deadline(result.interceptor.clone(), state.config.server().stream_deadline());
    spawn_logging(
        result.loggable,
        state.pricing.clone(),
        state.dispatcher.clone(),
    );

    let mut response = HttpResponse::build(client_status(result.status));
    for (name, value) in result.headers.iter() {
        response.append_header((name.as_str(), value.as_bytes()));
    }

    Ok(match result.body {
        Some(body) => response.streaming(body),
        None => response.finish(),
    })
}

/// Resolve the stream as timed out once `deadline` passes
fn spawn_deadline(interceptor: StreamInterceptor, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = interceptor.wait_for_chunk() => {}
            _ = tokio::time::sleep(deadline) => {
                if interceptor.timeout() {
                    warn!("Stream deadline of {:?} exceeded", deadline);
                }
            }
        }
    });
}

/// Finalize and enqueue the records off the client path
fn spawn_logging(loggable: Loggable, pricing: Arc<PricingService>, dispatcher: LogDispatcher) {
    let span = info_span!("log_delivery", request_id = %loggable.request().id);
    tokio::spawn(
        async move {
            let registry = pricing.snapshot();
            match loggable.finalize(&registry).await {
                Ok((request, response)) => {
                    if let Err(e) = dispatcher.dispatch_records(request, response).await {
                        error!("Failed to enqueue log records: {}", e);
                    }
                }
                Err(e) => error!("Failed to assemble log records: {}", e),
            }
        }
        .instrument(span),
    );
}

/// Upstream status as relayed to the client, coerced like the logged one
fn client_status(status: u16) -> StatusCode {
    u16::try_from(coerce_status(status))
        .ok()
        .and_then(|status| StatusCode::from_u16(status).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn convert_method(method: &actix_web::http::Method) -> Result<Method> {
    Method::from_bytes(method.as_str().as_bytes())
        .map_err(|e| GatewayError::bad_request(format!("invalid method: {}", e)))
}

fn convert_headers(headers: &actix_web::http::header::HeaderMap) -> HeaderMap {
    let mut converted = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            converted.append(name, value);
        }
    }
    converted
}
