//! Backend traits the delivery pipeline is written against

use crate::core::loggable::{RequestRecord, ResponseRecord};
use crate::services::delivery::{FeedbackRecord, QueueMessage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value store holding oversized payloads
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store `value` under `key`, expiring after `ttl`
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Durable at-least-once queue with named lanes
///
/// `read` returns this consumer's unacknowledged messages first, so a batch
/// that is not acknowledged is delivered again on the next read.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Append a message, returning its id
    async fn publish(&self, lane: &str, body: &str) -> Result<String>;

    /// Read up to `max` messages
    async fn read(&self, lane: &str, max: usize) -> Result<Vec<QueueMessage>>;

    /// Acknowledge messages so they are never delivered again
    async fn ack(&self, lane: &str, ids: &[String]) -> Result<()>;
}

/// Warehouse writes; every write is an upsert on the primary key
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn upsert_request(&self, record: &RequestRecord) -> Result<()>;

    async fn upsert_response(&self, record: &ResponseRecord) -> Result<()>;

    /// Apply all records or none of them
    async fn upsert_feedback_batch(&self, records: &[FeedbackRecord]) -> Result<()>;
}
