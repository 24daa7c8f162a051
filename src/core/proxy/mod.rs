//! Forwarding and stream interception

pub mod format;
pub mod forwarder;
pub mod handler;
pub mod interceptor;
pub mod types;

#[cfg(test)]
mod tests;

pub use format::CoalesceSmallChunks;
pub use forwarder::RequestForwarder;
pub use handler::{
    ControlHeaders, ID_HEADER, InboundCall, ProxyResult, RESPONSE_ID_HEADER, STATUS_HEADER,
    build_proxy_request, handle_proxy_request,
};
pub use interceptor::{CompletedChunk, InterceptedBody, StreamInterceptor, TerminalReason};
pub use types::{BodyStream, FeatureFlags, OmitFlags, ProxyRequest, UpstreamResponse};
