//! Server configuration

use super::*;
use crate::utils::error::RetryLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads
    pub workers: Option<usize>,
    /// Deadline for a proxied response in seconds; the stream is
    /// classified as timed out once it passes
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Upstream connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Bounds for retry options requested through `x-meter-retry-*`
    #[serde(default)]
    pub retry_limits: RetryLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            max_body_size: default_max_body_size(),
            retry_limits: RetryLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Deadline after which a proxied stream is cut and logged as timed out
    pub fn stream_deadline(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Get the number of workers (defaults to CPU count)
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }
}
