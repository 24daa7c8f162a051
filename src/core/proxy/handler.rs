//! Proxy request assembly and the forward-then-intercept flow

use super::format::CoalesceSmallChunks;
use super::forwarder::RequestForwarder;
use super::interceptor::StreamInterceptor;
use super::types::{BodyStream, FeatureFlags, OmitFlags, ProxyRequest, detect_stream};
use crate::config::ProviderConfig;
use crate::core::loggable::Loggable;
use crate::utils::error::{GatewayError, Result, RetryLimits, RetryOptions};
use bytes::Bytes;
use chrono::Utc;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Prefix shared by every gateway control header
pub const CONTROL_PREFIX: &str = "x-meter-";
pub const STATUS_HEADER: &str = "x-meter-status";
pub const ID_HEADER: &str = "x-meter-id";
/// Id of the logged response row, the key feedback is submitted against
pub const RESPONSE_ID_HEADER: &str = "x-meter-response-id";

pub const RETRY_ENABLED_HEADER: &str = "x-meter-retry-enabled";
pub const RETRY_NUM_HEADER: &str = "x-meter-retry-num";
pub const RETRY_FACTOR_HEADER: &str = "x-meter-retry-factor";
pub const RETRY_MIN_TIMEOUT_HEADER: &str = "x-meter-retry-min-timeout";
pub const RETRY_MAX_TIMEOUT_HEADER: &str = "x-meter-retry-max-timeout";
pub const FORCE_FORMAT_HEADER: &str = "x-meter-stream-force-format";
pub const OMIT_RESPONSE_HEADER: &str = "x-meter-omit-response";
pub const OMIT_REQUEST_HEADER: &str = "x-meter-omit-request";
pub const USER_ID_HEADER: &str = "x-meter-user-id";
pub const PROPERTY_PREFIX: &str = "x-meter-property-";
pub const REQUEST_ID_HEADER: &str = "x-meter-request-id";

/// Connection-scoped headers that are never relayed
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Client-facing body
pub type ClientBody = BodyStream;

/// What the HTTP layer needs to answer the client and log the call
pub struct ProxyResult {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<ClientBody>,
    pub loggable: Loggable,
    pub interceptor: StreamInterceptor,
}

/// Inbound call as seen by the HTTP layer
#[derive(Debug, Clone)]
pub struct InboundCall {
    pub method: Method,
    /// Path after the provider segment
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forward the call and split the answer between client and logger
///
/// Only forwarding failures are returned as errors.
pub async fn handle_proxy_request(
    forwarder: &RequestForwarder,
    request: ProxyRequest,
) -> Result<ProxyResult> {
    let request = Arc::new(request);
    let upstream = forwarder.dispatch(&request).await?;

    let (interceptor, intercepted) = StreamInterceptor::new(upstream.body);
    let body: Option<ClientBody> = intercepted.map(|body| {
        if request.flags.stream_force_format {
            Box::pin(CoalesceSmallChunks::new(body)) as ClientBody
        } else {
            Box::pin(body) as ClientBody
        }
    });

    let loggable = Loggable::new(request.clone(), upstream.status, interceptor.clone());

    let mut headers = filter_response_headers(&upstream.headers);
    headers.insert(
        HeaderName::from_static(STATUS_HEADER),
        HeaderValue::from_static("success"),
    );
    if let Ok(id) = HeaderValue::from_str(&request.id) {
        headers.insert(HeaderName::from_static(ID_HEADER), id);
    }
    if let Ok(id) = HeaderValue::from_str(loggable.response_id()) {
        headers.insert(HeaderName::from_static(RESPONSE_ID_HEADER), id);
    }

    Ok(ProxyResult {
        status: upstream.status,
        headers,
        body,
        loggable,
        interceptor,
    })
}

/// Build the request snapshot for a configured provider
///
/// Requested retry options are clamped into `limits`.
pub fn build_proxy_request(
    provider: &ProviderConfig,
    call: InboundCall,
    limits: &RetryLimits,
) -> Result<ProxyRequest> {
    let target_url = target_url(&provider.base_url, &call.path, call.query.as_deref())?;
    let control = ControlHeaders::parse(&call.headers)?;
    let is_stream = detect_stream(&call.headers, &call.body);

    Ok(ProxyRequest {
        id: control.request_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        start_time: Utc::now(),
        provider: provider.name.clone(),
        target_url,
        method: call.method,
        headers: outbound_headers(&call.headers),
        body: call.body,
        is_stream,
        retry_options: control.retry_options.map(|options| options.bounded(limits)),
        flags: control.flags,
        omit: control.omit,
        user_id: control.user_id,
        properties: control.properties,
    })
}

/// `base_url` + path + query
pub fn target_url(base_url: &str, path: &str, query: Option<&str>) -> Result<Url> {
    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    Url::parse(&url)
        .map_err(|e| GatewayError::bad_request(format!("invalid target url {}: {}", url, e)))
}

/// Request headers minus control, host, hop-by-hop and length headers
///
/// `accept-encoding` is dropped so the relayed body arrives uncompressed and
/// usage can be read from it.
pub fn outbound_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            !name.starts_with(CONTROL_PREFIX)
                && name != "host"
                && name != "content-length"
                && name != "accept-encoding"
                && !HOP_BY_HOP.contains(&name)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Upstream headers minus hop-by-hop ones
///
/// `content-length` is dropped too since the relayed body may end early.
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            name != "content-length" && !HOP_BY_HOP.contains(&name)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Parsed `x-meter-*` request headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlHeaders {
    pub retry_options: Option<RetryOptions>,
    pub flags: FeatureFlags,
    pub omit: OmitFlags,
    pub user_id: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub request_id: Option<String>,
}

impl ControlHeaders {
    pub fn parse(headers: &HeaderMap) -> Result<Self> {
        let retry_options = if flag(headers, RETRY_ENABLED_HEADER) {
            let mut options = RetryOptions::default();
            if let Some(n) = number::<u32>(headers, RETRY_NUM_HEADER)? {
                options.max_retries = n;
            }
            if let Some(factor) = number::<f64>(headers, RETRY_FACTOR_HEADER)? {
                options.factor = factor;
            }
            if let Some(ms) = number::<u64>(headers, RETRY_MIN_TIMEOUT_HEADER)? {
                options.min_timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = number::<u64>(headers, RETRY_MAX_TIMEOUT_HEADER)? {
                options.max_timeout = Duration::from_millis(ms);
            }
            Some(options)
        } else {
            None
        };

        let properties = headers
            .iter()
            .filter_map(|(name, value)| {
                let key = name.as_str().strip_prefix(PROPERTY_PREFIX)?;
                let value = value.to_str().ok()?;
                (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
            })
            .collect();

        Ok(Self {
            retry_options,
            flags: FeatureFlags {
                stream_force_format: flag(headers, FORCE_FORMAT_HEADER),
            },
            omit: OmitFlags {
                omit_request: flag(headers, OMIT_REQUEST_HEADER),
                omit_response: flag(headers, OMIT_RESPONSE_HEADER),
            },
            user_id: text(headers, USER_ID_HEADER),
            properties,
            request_id: text(headers, REQUEST_ID_HEADER),
        })
    }
}

fn text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn flag(headers: &HeaderMap, name: &str) -> bool {
    text(headers, name).is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Result<Option<T>> {
    match text(headers, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| GatewayError::bad_request(format!("invalid {} header: {}", name, raw))),
        None => Ok(None),
    }
}
