//! Delivery queue configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lanes, batching and redelivery settings for the delivery pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Payloads larger than this go through the KV fallback lane
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Messages pulled per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Idle wait between empty polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long an unacknowledged batch stays pending before redelivery
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Deliveries after which a message is dead-lettered
    #[serde(default = "default_max_deliveries")]
    pub max_deliveries: u32,
    /// TTL of fallback payloads in the KV store
    #[serde(default = "default_fallback_ttl_secs")]
    pub fallback_ttl_secs: u64,
    #[serde(default)]
    pub lanes: LaneNames,
    /// Consumer group shared by all gateway instances
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    /// This instance's consumer name; a random one is generated when unset
    #[serde(default)]
    pub consumer_name: Option<String>,
    /// Whether this instance runs the lane workers
    #[serde(default = "default_true")]
    pub consume: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: default_max_message_bytes(),
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            max_deliveries: default_max_deliveries(),
            fallback_ttl_secs: default_fallback_ttl_secs(),
            lanes: LaneNames::default(),
            consumer_group: default_consumer_group(),
            consumer_name: None,
            consume: true,
        }
    }
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }
}

fn default_consumer_group() -> String {
    "llm-meter".to_string()
}

/// Queue lane names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaneNames {
    #[serde(default = "default_primary_lane")]
    pub primary: String,
    #[serde(default = "default_fallback_lane")]
    pub fallback: String,
    #[serde(default = "default_feedback_lane")]
    pub feedback: String,
}

impl Default for LaneNames {
    fn default() -> Self {
        Self {
            primary: default_primary_lane(),
            fallback: default_fallback_lane(),
            feedback: default_feedback_lane(),
        }
    }
}

fn default_primary_lane() -> String {
    "request-response-logs".to_string()
}

fn default_fallback_lane() -> String {
    "request-response-kv-fallback".to_string()
}

fn default_feedback_lane() -> String {
    "response-feedback".to_string()
}
