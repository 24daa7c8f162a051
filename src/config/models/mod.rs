//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

#![allow(missing_docs)]

pub mod gateway;
pub mod logging;
pub mod pricing;
pub mod provider;
pub mod queue;
pub mod server;
pub mod storage;

// Re-export all configuration types
pub use gateway::*;
pub use logging::*;
pub use pricing::*;
pub use provider::*;
pub use queue::*;
pub use server::*;
pub use storage::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8787
}

/// Default timeout in seconds
pub fn default_timeout() -> u64 {
    600
}

/// Default upstream connect timeout in seconds
pub fn default_connect_timeout() -> u64 {
    10
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    32 * 1024 * 1024 // 32MB
}

pub fn default_true() -> bool {
    true
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_redis_max_connections() -> u32 {
    20
}

/// Largest payload carried inline on the primary lane
pub fn default_max_message_bytes() -> usize {
    128 * 1024
}

pub fn default_batch_size() -> usize {
    50
}

pub fn default_poll_interval_ms() -> u64 {
    500
}

pub fn default_retry_delay_ms() -> u64 {
    5_000
}

pub fn default_max_deliveries() -> u32 {
    5
}

/// Fallback payloads outlive several redelivery rounds
pub fn default_fallback_ttl_secs() -> u64 {
    7 * 24 * 3600
}

pub fn default_log_level() -> String {
    "info".to_string()
}
