//! Request and response types for the proxy path

use crate::utils::error::{GatewayError, Result, RetryOptions};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use reqwest::Method;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use std::collections::BTreeMap;
use url::Url;

/// Upstream body as a stream of chunks
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Per-request feature switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Coalesce very short chunks before relaying them
    pub stream_force_format: bool,
}

/// Privacy switches controlling what is written to the warehouse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OmitFlags {
    pub omit_request: bool,
    pub omit_response: bool,
}

/// Immutable snapshot of one inbound call
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub provider: String,
    pub target_url: Url,
    pub method: Method,
    /// Headers to send upstream, control headers already removed
    pub headers: HeaderMap,
    pub body: Bytes,
    pub is_stream: bool,
    /// Presence selects the retrying forward path
    pub retry_options: Option<RetryOptions>,
    pub flags: FeatureFlags,
    pub omit: OmitFlags,
    pub user_id: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl ProxyRequest {
    /// Path component of the upstream URL
    pub fn path(&self) -> &str {
        self.target_url.path()
    }

    /// Request body as JSON, if it is JSON
    pub fn body_json(&self) -> Option<serde_json::Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    /// Model named in the request body
    pub fn model(&self) -> Option<String> {
        self.body_json()?
            .get("model")?
            .as_str()
            .map(str::to_string)
    }

    /// Request body as text, if it is valid UTF-8
    pub fn body_text(&self) -> Option<String> {
        if self.body.is_empty() {
            return None;
        }
        std::str::from_utf8(&self.body).ok().map(str::to_string)
    }
}

/// Whether a request asks for a streamed response
///
/// True when the JSON body sets `"stream": true` or the caller accepts
/// `text/event-stream`.
pub fn detect_stream(headers: &HeaderMap, body: &[u8]) -> bool {
    let accepts_sse = headers
        .get(reqwest::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    if accepts_sse {
        return true;
    }
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("stream").and_then(|s| s.as_bool()))
        .unwrap_or(false)
}

/// Answer received from the provider
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// `None` for responses that carry no body
    pub body: Option<BodyStream>,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl UpstreamResponse {
    /// Whether a response with this shape can carry a body
    pub fn has_body(method: &Method, status: u16, headers: &HeaderMap) -> bool {
        if *method == Method::HEAD || status == 204 || status == 304 {
            return false;
        }
        let zero_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            == Some(0);
        !zero_length
    }

    /// Build a response from a body held in memory
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        let stream = futures::stream::once(async move { Ok::<_, GatewayError>(body) });
        Self {
            status,
            headers,
            body: Some(Box::pin(stream)),
        }
    }
}
