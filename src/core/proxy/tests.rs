//! Tests for forwarding and interception

use super::forwarder::{RequestForwarder, is_retryable_status};
use super::handler::{
    ControlHeaders, ID_HEADER, InboundCall, RESPONSE_ID_HEADER, STATUS_HEADER,
    build_proxy_request, filter_response_headers, handle_proxy_request, outbound_headers,
    target_url,
};
use super::interceptor::{StreamInterceptor, TerminalReason};
use super::types::{BodyStream, FeatureFlags, OmitFlags, ProxyRequest, detect_stream};
use crate::config::ProviderConfig;
use crate::core::loggable::Loggable;
use crate::services::pricing::CostRegistry;
use crate::utils::error::{GatewayError, Result, RetryLimits, RetryOptions};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use futures::channel::mpsc;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn proxy_request(url: &str, body: &str, is_stream: bool) -> ProxyRequest {
    ProxyRequest {
        id: "req-1".to_string(),
        start_time: Utc::now(),
        provider: "openai".to_string(),
        target_url: Url::parse(url).unwrap(),
        method: Method::POST,
        headers: HeaderMap::new(),
        body: Bytes::from(body.to_string()),
        is_stream,
        retry_options: None,
        flags: FeatureFlags::default(),
        omit: OmitFlags::default(),
        user_id: None,
        properties: BTreeMap::new(),
    }
}

fn fast_retry(max_retries: u32) -> RetryOptions {
    RetryOptions {
        max_retries,
        factor: 1.0,
        min_timeout: Duration::from_millis(1),
        max_timeout: Duration::from_millis(2),
        randomize: false,
    }
}

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    map
}

fn channel_body() -> (mpsc::UnboundedSender<Result<Bytes>>, BodyStream) {
    let (tx, rx) = mpsc::unbounded();
    (tx, Box::pin(rx))
}

// -- interceptor --

#[tokio::test]
async fn test_done_outcome_is_memoized() {
    let chunks: Vec<Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"hel")),
        Ok(Bytes::from_static(b"lo")),
    ];
    let (handle, body) = StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));

    let relayed: Vec<Bytes> = body.unwrap().map(|c| c.unwrap()).collect().await;
    assert_eq!(relayed, vec![Bytes::from_static(b"hel"), Bytes::from_static(b"lo")]);

    let first = handle.wait_for_chunk().await;
    let second = handle.clone().wait_for_chunk().await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.reason, TerminalReason::Done);
    assert_eq!(first.body, Bytes::from_static(b"hello"));
    assert!(first.first_chunk_time.is_some());
}

#[tokio::test]
async fn test_waiters_registered_before_completion_are_woken() {
    let (tx, body) = channel_body();
    let (handle, body) = StreamInterceptor::new(Some(body));
    let mut body = body.unwrap();

    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_for_chunk().await })
    };

    tx.unbounded_send(Ok(Bytes::from_static(b"abc"))).unwrap();
    assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"abc"));
    drop(tx);
    assert!(body.next().await.is_none());

    let outcome = waiter.await.unwrap();
    assert_eq!(outcome.reason, TerminalReason::Done);
    assert_eq!(outcome.body, Bytes::from_static(b"abc"));
}

#[tokio::test]
async fn test_client_cancel_keeps_relayed_bytes() {
    let (tx, body) = channel_body();
    let (handle, body) = StreamInterceptor::new(Some(body));
    let mut body = body.unwrap();

    tx.unbounded_send(Ok(Bytes::from_static(b"data: one\n\n"))).unwrap();
    tx.unbounded_send(Ok(Bytes::from_static(b"data: two\n\n"))).unwrap();
    body.next().await.unwrap().unwrap();
    body.next().await.unwrap().unwrap();
    drop(body);

    // sent after the client left, never relayed
    let _ = tx.unbounded_send(Ok(Bytes::from_static(b"data: three\n\n")));

    let outcome = handle.wait_for_chunk().await;
    assert_eq!(outcome.reason, TerminalReason::Cancel);
    assert_eq!(outcome.body, Bytes::from_static(b"data: one\n\ndata: two\n\n"));
}

#[tokio::test]
async fn test_timeout_ends_client_stream() {
    let (tx, body) = channel_body();
    let (handle, body) = StreamInterceptor::new(Some(body));
    let mut body = body.unwrap();

    tx.unbounded_send(Ok(Bytes::from_static(b"partial"))).unwrap();
    body.next().await.unwrap().unwrap();

    assert!(handle.timeout());
    assert!(!handle.cancel());
    assert!(body.next().await.is_none());
    drop(body);

    let outcome = handle.wait_for_chunk().await;
    assert_eq!(outcome.reason, TerminalReason::Timeout);
    assert_eq!(outcome.body, Bytes::from_static(b"partial"));
}

#[tokio::test]
async fn test_upstream_failure_resolves_error() {
    let chunks: Vec<Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"ok")),
        Err(GatewayError::upstream("reset by peer")),
    ];
    let (handle, body) = StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));
    let mut body = body.unwrap();

    assert!(body.next().await.unwrap().is_ok());
    assert!(body.next().await.unwrap().is_err());

    let outcome = handle.wait_for_chunk().await;
    assert_eq!(outcome.reason, TerminalReason::Error);
    assert_eq!(outcome.body, Bytes::from_static(b"ok"));
}

#[tokio::test]
async fn test_no_body_resolves_immediately() {
    let (handle, body) = StreamInterceptor::new(None);
    assert!(body.is_none());
    assert!(handle.is_resolved());

    let outcome = handle.wait_for_chunk().await;
    assert_eq!(outcome.reason, TerminalReason::Done);
    assert!(outcome.body.is_empty());
    assert!(outcome.first_chunk_time.is_none());
}

#[tokio::test]
async fn test_deadline_wakes_client_parked_on_slow_upstream() {
    let upstream: BodyStream = Box::pin(async_stream::stream! {
        yield Ok::<Bytes, GatewayError>(Bytes::from_static(b"data: first\n\n"));
        tokio::time::sleep(Duration::from_secs(60)).await;
        yield Ok(Bytes::from_static(b"data: late\n\n"));
    });
    let (handle, body) = StreamInterceptor::new(Some(upstream));
    let mut body = body.unwrap();
    assert_eq!(
        body.next().await.unwrap().unwrap(),
        Bytes::from_static(b"data: first\n\n")
    );

    let deadline = {
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.timeout()
        })
    };

    assert!(body.next().await.is_none());
    assert!(deadline.await.unwrap());

    let outcome = handle.wait_for_chunk().await;
    assert_eq!(outcome.reason, TerminalReason::Timeout);
    assert_eq!(outcome.body, Bytes::from_static(b"data: first\n\n"));
}

// -- loggable over an interceptor --

#[tokio::test]
async fn test_cancelled_stream_logs_minus_three() {
    let (tx, body) = channel_body();
    let (handle, body) = StreamInterceptor::new(Some(body));
    let mut body = body.unwrap();
    let request = Arc::new(proxy_request("https://api.openai.com/v1/chat/completions", "{}", true));
    let loggable = Loggable::new(request, 200, handle);

    tx.unbounded_send(Ok(Bytes::from_static(b"data: {\"model\":\"gpt-4\"}\n\n")))
        .unwrap();
    body.next().await.unwrap().unwrap();
    drop(body);

    assert_eq!(loggable.status().await.unwrap(), -3);
    assert_eq!(
        loggable.response_body().await.unwrap(),
        "data: {\"model\":\"gpt-4\"}\n\n"
    );
    assert!(loggable.time_to_first_token().await.unwrap().is_some());
}

#[tokio::test]
async fn test_finalize_prices_gpt4_call() {
    let body = r#"{"model":"gpt-4-0613","usage":{"prompt_tokens":100,"completion_tokens":50}}"#;
    let chunks: Vec<Result<Bytes>> = vec![Ok(Bytes::from(body))];
    let (handle, stream) = StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));
    let request = Arc::new(proxy_request(
        "https://api.openai.com/v1/chat/completions",
        r#"{"model":"gpt-4"}"#,
        false,
    ));
    let loggable = Loggable::new(request, 200, handle);
    let _: Vec<_> = stream.unwrap().collect().await;

    let registry = CostRegistry::builtin().unwrap();
    let (req, resp) = loggable.finalize(&registry).await.unwrap();

    assert_eq!(req.id, "req-1");
    assert_eq!(req.model.as_deref(), Some("gpt-4"));
    assert_eq!(resp.request_id, "req-1");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.model.as_deref(), Some("gpt-4-0613"));
    assert_eq!(resp.prompt_tokens, Some(100));
    assert_eq!(resp.completion_tokens, Some(50));
    assert!((resp.cost.unwrap() - 0.006).abs() < 1e-12);
    assert_eq!(resp.time_to_first_token_ms, None);
    assert_eq!(resp.completion_reason.as_deref(), Some("done"));
}

#[tokio::test]
async fn test_response_row_names_matched_cost_table() {
    let body = r#"{"model":"gpt-35-turbo","usage":{"prompt_tokens":1000,"completion_tokens":1000}}"#;
    let chunks: Vec<Result<Bytes>> = vec![Ok(Bytes::from(body))];
    let (handle, stream) = StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));
    let mut request = proxy_request("https://eastus.example.com/v1/chat/completions", "{}", false);
    request.provider = "azure-eastus".to_string();
    let loggable = Loggable::new(Arc::new(request), 200, handle);
    let _: Vec<_> = stream.unwrap().collect().await;

    let (req, resp) = loggable
        .finalize(&CostRegistry::builtin().unwrap())
        .await
        .unwrap();
    assert_eq!(req.provider, "azure-eastus");
    assert_eq!(resp.provider, "azure");
    assert!((resp.cost.unwrap() - 0.0035).abs() < 1e-12);
}

#[tokio::test]
async fn test_omit_response_never_reads_body() {
    let chunks: Vec<Result<Bytes>> = vec![Ok(Bytes::from_static(b"secret"))];
    let (handle, stream) = StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));
    let mut request = proxy_request("https://api.openai.com/v1/chat/completions", "{}", false);
    request.omit = OmitFlags {
        omit_request: true,
        omit_response: true,
    };
    let loggable = Loggable::new(Arc::new(request), 200, handle);
    let _: Vec<_> = stream.unwrap().collect().await;

    let (req, resp) = loggable
        .finalize(&CostRegistry::builtin().unwrap())
        .await
        .unwrap();
    assert!(loggable.omit_log());
    assert!(!loggable.body_has_been_read());
    assert_eq!(req.body, None);
    assert_eq!(resp.body, None);
    assert_eq!(resp.cost, None);
    assert_eq!(resp.status, 200);
}

#[tokio::test]
async fn test_invalid_status_is_coerced() {
    let (handle, _) = StreamInterceptor::new(None);
    let request = Arc::new(proxy_request("https://api.openai.com/v1/models", "", false));
    let loggable = Loggable::new(request, 700, handle);
    assert_eq!(loggable.status().await.unwrap(), 500);
}

// -- forwarder --

#[tokio::test]
async fn test_retry_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
    let request = proxy_request(&format!("{}/v1/chat/completions", server.uri()), "{}", false);
    let response = forwarder
        .forward_with_retry(&request, &fast_retry(3))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_exhausted_retries_return_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&server)
        .await;

    let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
    let mut request = proxy_request(&format!("{}/v1/chat/completions", server.uri()), "{}", false);
    request.retry_options = Some(fast_retry(2));

    let response = forwarder.dispatch(&request).await.unwrap();
    assert_eq!(response.status, 429);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
    let request = proxy_request(&format!("{}/v1/chat/completions", server.uri()), "{}", false);
    let response = forwarder
        .forward_with_retry(&request, &fast_retry(4))
        .await
        .unwrap();
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_network_failure_is_an_upstream_error() {
    let forwarder = RequestForwarder::new(Duration::from_millis(500)).unwrap();
    let request = proxy_request("http://127.0.0.1:1/v1/chat/completions", "{}", false);
    let err = forwarder
        .forward_with_retry(&request, &fast_retry(1))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Upstream(_)));
}

#[tokio::test]
async fn test_head_response_has_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
    let mut request = proxy_request(&format!("{}/v1/models", server.uri()), "", false);
    request.method = Method::HEAD;
    let response = forwarder.forward(&request).await.unwrap();
    assert!(response.body.is_none());
}

#[test]
fn test_retryable_statuses() {
    assert!(is_retryable_status(500));
    assert!(is_retryable_status(503));
    assert!(is_retryable_status(429));
    assert!(!is_retryable_status(400));
    assert!(!is_retryable_status(404));
    assert!(!is_retryable_status(200));
}

// -- handler --

#[tokio::test]
async fn test_handle_proxy_request_sets_gateway_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-upstream-trace", "abc")
                .set_body_string(r#"{"model":"gpt-4","usage":{"prompt_tokens":1,"completion_tokens":1}}"#),
        )
        .mount(&server)
        .await;

    let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
    let request = proxy_request(&format!("{}/v1/chat/completions", server.uri()), "{}", false);
    let result = handle_proxy_request(&forwarder, request).await.unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.headers.get(STATUS_HEADER).unwrap(), "success");
    assert_eq!(result.headers.get(ID_HEADER).unwrap(), "req-1");
    assert_eq!(
        result.headers.get(RESPONSE_ID_HEADER).unwrap(),
        result.loggable.response_id()
    );
    assert_eq!(result.headers.get("x-upstream-trace").unwrap(), "abc");
    assert!(result.headers.get("content-length").is_none());

    let body: Vec<Bytes> = result.body.unwrap().map(|c| c.unwrap()).collect().await;
    assert_eq!(body.concat().len(), 67);
    assert_eq!(result.loggable.status().await.unwrap(), 200);
}

#[tokio::test]
async fn test_force_format_coalesces_client_chunks_only() {
    let chunks: Vec<Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"a")),
        Ok(Bytes::from(vec![b'b'; 60])),
    ];
    let (handle, body) = StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));
    let client = super::format::CoalesceSmallChunks::new(body.unwrap());
    let relayed: Vec<Bytes> = client.map(|c| c.unwrap()).collect().await;

    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].len(), 61);
    let outcome = handle.wait_for_chunk().await;
    assert_eq!(outcome.body.len(), 61);
    assert_eq!(outcome.reason, TerminalReason::Done);
}

#[test]
fn test_control_headers_parse() {
    let map = headers(&[
        ("x-meter-retry-enabled", "true"),
        ("x-meter-retry-num", "2"),
        ("x-meter-retry-factor", "1.5"),
        ("x-meter-retry-min-timeout", "10"),
        ("x-meter-retry-max-timeout", "100"),
        ("x-meter-stream-force-format", "true"),
        ("x-meter-omit-response", "1"),
        ("x-meter-user-id", "user-42"),
        ("x-meter-property-team", "search"),
        ("x-meter-request-id", "fixed-id"),
    ]);
    let control = ControlHeaders::parse(&map).unwrap();

    let retry = control.retry_options.unwrap();
    assert_eq!(retry.max_retries, 2);
    assert_eq!(retry.factor, 1.5);
    assert_eq!(retry.min_timeout, Duration::from_millis(10));
    assert_eq!(retry.max_timeout, Duration::from_millis(100));
    assert!(control.flags.stream_force_format);
    assert!(control.omit.omit_response);
    assert!(!control.omit.omit_request);
    assert_eq!(control.user_id.as_deref(), Some("user-42"));
    assert_eq!(control.properties.get("team").map(String::as_str), Some("search"));
    assert_eq!(control.request_id.as_deref(), Some("fixed-id"));
}

#[test]
fn test_retry_headers_ignored_without_enable_flag() {
    let control = ControlHeaders::parse(&headers(&[("x-meter-retry-num", "3")])).unwrap();
    assert!(control.retry_options.is_none());
}

#[test]
fn test_bad_retry_number_is_rejected() {
    let map = headers(&[
        ("x-meter-retry-enabled", "true"),
        ("x-meter-retry-num", "many"),
    ]);
    let err = ControlHeaders::parse(&map).unwrap_err();
    assert!(matches!(err, GatewayError::BadRequest(_)));
}

#[test]
fn test_requested_retries_are_clamped() {
    let provider = ProviderConfig::new("openai", "https://api.openai.com");
    let call = InboundCall {
        method: Method::POST,
        path: "v1/chat/completions".to_string(),
        query: None,
        headers: headers(&[
            ("x-meter-retry-enabled", "true"),
            ("x-meter-retry-num", "4294967295"),
            ("x-meter-retry-min-timeout", "0"),
            ("x-meter-retry-max-timeout", "0"),
        ]),
        body: Bytes::from_static(b"{}"),
    };
    let limits = RetryLimits::default();

    let request = build_proxy_request(&provider, call, &limits).unwrap();
    let retry = request.retry_options.unwrap();
    assert_eq!(retry.max_retries, limits.max_retries);
    assert_eq!(retry.min_timeout, limits.min_timeout);
    assert!(retry.delay_for(0) >= limits.min_timeout);
}

#[test]
fn test_outbound_headers_strip_control_and_host() {
    let map = headers(&[
        ("host", "localhost:8787"),
        ("authorization", "Bearer sk-test"),
        ("x-meter-user-id", "u"),
        ("connection", "keep-alive"),
        ("content-type", "application/json"),
    ]);
    let out = outbound_headers(&map);
    assert!(out.get("host").is_none());
    assert!(out.get("x-meter-user-id").is_none());
    assert!(out.get("connection").is_none());
    assert_eq!(out.get("authorization").unwrap(), "Bearer sk-test");
    assert_eq!(out.get("content-type").unwrap(), "application/json");
}

#[test]
fn test_response_headers_drop_hop_by_hop() {
    let map = headers(&[
        ("transfer-encoding", "chunked"),
        ("keep-alive", "timeout=5"),
        ("content-type", "text/event-stream"),
    ]);
    let out = filter_response_headers(&map);
    assert_eq!(out.len(), 1);
    assert_eq!(out.get("content-type").unwrap(), "text/event-stream");
}

#[test]
fn test_target_url_join() {
    let url = target_url("https://api.openai.com/", "/v1/chat/completions", Some("a=1")).unwrap();
    assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions?a=1");

    let url = target_url("https://example.com/base", "v1/models", None).unwrap();
    assert_eq!(url.as_str(), "https://example.com/base/v1/models");
}

#[test]
fn test_stream_detection() {
    assert!(detect_stream(&HeaderMap::new(), br#"{"stream":true}"#));
    assert!(!detect_stream(&HeaderMap::new(), br#"{"stream":false}"#));
    assert!(!detect_stream(&HeaderMap::new(), b"not json"));
    assert!(detect_stream(&headers(&[("accept", "text/event-stream")]), b""));
}
