//! Deferred log record for one proxied call

use super::deferred::Deferred;
use super::records::{RequestRecord, ResponseRecord};
use super::status::normalize_status;
use super::usage::{Usage, extract_usage};
use crate::core::proxy::{CompletedChunk, ProxyRequest, StreamInterceptor};
use crate::services::pricing::CostRegistry;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Request snapshot plus lazy accessors over the response outcome
///
/// Nothing here blocks the client stream: every accessor waits on the
/// interceptor outcome and is only awaited by the logging task.
#[derive(Debug, Clone)]
pub struct Loggable {
    request: Arc<ProxyRequest>,
    response_id: String,
    omit_log: bool,
    outcome: Deferred<Arc<CompletedChunk>>,
    body: Deferred<String>,
    status: Deferred<i32>,
    time_to_first_token: Deferred<Option<i64>>,
}

impl Loggable {
    pub fn new(
        request: Arc<ProxyRequest>,
        upstream_status: u16,
        interceptor: StreamInterceptor,
    ) -> Self {
        let outcome = Deferred::new(async move { Ok(interceptor.wait_for_chunk().await) });

        let body = {
            let outcome = outcome.clone();
            Deferred::new(async move {
                let chunk = outcome.get().await.map_err(|e| e.to_string())?;
                String::from_utf8(chunk.body.to_vec())
                    .map_err(|e| format!("response body is not UTF-8: {}", e))
            })
        };

        let status = {
            let outcome = outcome.clone();
            Deferred::new(async move {
                let chunk = outcome.get().await.map_err(|e| e.to_string())?;
                Ok(normalize_status(upstream_status, Some(chunk.reason)))
            })
        };

        let time_to_first_token = {
            let outcome = outcome.clone();
            let start = request.start_time;
            let is_stream = request.is_stream;
            Deferred::new(async move {
                if !is_stream {
                    return Ok(None);
                }
                let chunk = outcome.get().await.map_err(|e| e.to_string())?;
                Ok(chunk
                    .first_chunk_time
                    .map(|first| (first - start).num_milliseconds()))
            })
        };

        Self {
            omit_log: request.omit.omit_response,
            request,
            response_id: Uuid::new_v4().to_string(),
            outcome,
            body,
            status,
            time_to_first_token,
        }
    }

    pub fn request(&self) -> &ProxyRequest {
        &self.request
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn omit_log(&self) -> bool {
        self.omit_log
    }

    /// Relayed response body as text
    pub async fn response_body(&self) -> Result<String> {
        self.body.get().await
    }

    /// Normalized status, negative for abnormal terminations
    pub async fn status(&self) -> Result<i32> {
        self.status.get().await
    }

    /// Milliseconds from request start to the first relayed chunk
    ///
    /// Only measured for streaming requests.
    pub async fn time_to_first_token(&self) -> Result<Option<i64>> {
        self.time_to_first_token.get().await
    }

    pub async fn end_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.outcome.get().await?.end_time)
    }

    pub fn body_has_been_read(&self) -> bool {
        self.body.has_been_read()
    }

    /// Build insert-ready records, pricing the call against `registry`
    ///
    /// The response row names the cost table it was priced under, while the
    /// request row keeps the configured provider name.
    pub async fn finalize(&self, registry: &CostRegistry) -> Result<(RequestRecord, ResponseRecord)> {
        let request = self.request_record();
        let outcome = self.outcome.get().await?;
        let status = self.status().await?;
        let time_to_first_token_ms = self.time_to_first_token().await?;

        let (body, usage) = if self.omit_log {
            (None, Usage::default())
        } else {
            match self.response_body().await {
                Ok(body) => {
                    let usage = extract_usage(&body);
                    (Some(body), usage)
                }
                Err(e) => {
                    warn!(request_id = %self.request.id, "Response body unavailable: {}", e);
                    (None, Usage::default())
                }
            }
        };

        let model = usage.model.clone().or_else(|| request.model.clone());
        let cost = if self.omit_log {
            None
        } else {
            model.as_deref().and_then(|model| {
                registry.price(
                    model,
                    &self.request.provider,
                    non_negative(usage.prompt_tokens),
                    non_negative(usage.completion_tokens),
                    1,
                    1,
                )
            })
        };

        debug!(
            request_id = %self.request.id,
            status,
            reason = %outcome.reason,
            "Finalized log record"
        );

        let response = ResponseRecord {
            id: self.response_id.clone(),
            request_id: self.request.id.clone(),
            created_at: outcome.end_time,
            provider: registry
                .canonical_provider(&self.request.provider)
                .to_string(),
            status,
            body,
            model,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost,
            delay_ms: (outcome.end_time - self.request.start_time).num_milliseconds(),
            time_to_first_token_ms,
            completion_reason: Some(outcome.reason.to_string()),
        };

        Ok((request, response))
    }

    fn request_record(&self) -> RequestRecord {
        let request = &self.request;
        RequestRecord {
            id: request.id.clone(),
            created_at: request.start_time,
            provider: request.provider.clone(),
            target_url: request.target_url.to_string(),
            method: request.method.to_string(),
            path: request.path().to_string(),
            body: if request.omit.omit_request {
                None
            } else {
                request.body_text()
            },
            model: request.model(),
            is_stream: request.is_stream,
            user_id: request.user_id.clone(),
            properties: request.properties.clone(),
        }
    }
}

fn non_negative(tokens: Option<i64>) -> u64 {
    tokens.map(|t| t.max(0) as u64).unwrap_or(0)
}
