//! Core request path
//!
//! Forwarding, stream interception and log record assembly.

pub mod loggable;
pub mod proxy;
