//! Error handling for the Gateway
//!
//! This module defines the gateway error type, its HTTP rendering and the
//! retry policy used by the upstream forwarder.

#![allow(missing_docs)]

mod helpers;
pub mod recovery;
mod response;
mod types;

pub use recovery::{RetryLimits, RetryOptions, RetryPolicy};
pub use response::{ERROR_HEADER, ErrorDetail, ErrorResponse};
pub use types::{GatewayError, Result};
