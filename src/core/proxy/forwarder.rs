//! Outbound calls to the provider

use super::types::{ProxyRequest, UpstreamResponse};
use crate::utils::error::{GatewayError, Result, RetryOptions, RetryPolicy};
use futures::TryStreamExt;
use reqwest::Client;
use std::time::Duration;

/// Sends the upstream call, optionally under a retry policy
///
/// Stateless apart from the pooled HTTP client.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: Client,
}

impl RequestForwarder {
    /// Create a forwarder with its own connection pool
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { client })
    }

    /// Forward once, or under the request's retry options when present
    pub async fn dispatch(&self, request: &ProxyRequest) -> Result<UpstreamResponse> {
        match &request.retry_options {
            Some(options) => self.forward_with_retry(request, options).await,
            None => self.forward(request).await,
        }
    }

    /// Single attempt
    pub async fn forward(&self, request: &ProxyRequest) -> Result<UpstreamResponse> {
        let response = self
            .client
            .request(request.method.clone(), request.target_url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| GatewayError::upstream(format!("{}: {}", request.target_url, e)))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = if UpstreamResponse::has_body(&request.method, status, &headers) {
            let stream = response
                .bytes_stream()
                .map_err(|e| GatewayError::upstream(format!("body stream failed: {}", e)));
            Some(Box::pin(stream) as super::types::BodyStream)
        } else {
            None
        };

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Attempt up to `max_retries + 1` times
    ///
    /// Network failures, 5xx and 429 are retried. When attempts run out on a
    /// retryable status the last response is returned, on a network failure
    /// the last error is.
    pub async fn forward_with_retry(
        &self,
        request: &ProxyRequest,
        options: &RetryOptions,
    ) -> Result<UpstreamResponse> {
        RetryPolicy::new(options.clone())
            .call(|| self.forward(request), should_retry)
            .await
    }
}

/// Whether an attempt outcome is transient
pub fn should_retry(outcome: &Result<UpstreamResponse>) -> bool {
    match outcome {
        Ok(response) => is_retryable_status(response.status),
        Err(e) => e.is_retryable(),
    }
}

/// 5xx and 429
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}
