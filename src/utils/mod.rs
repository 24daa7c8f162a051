//! Utility modules for the gateway
//!
//! - **error**: Error types, HTTP rendering and retry policy
//! - **logging**: Tracing subscriber setup

pub mod error;
pub mod logging;
