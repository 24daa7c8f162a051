//! Fallback lane: KV pointers to oversized payloads

use super::handler::BatchHandler;
use super::primary::apply_payload;
use super::types::{BatchOutcome, LogPayload, QueueMessage};
use crate::storage::{KvStore, LogStore};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves each key and upserts the payload behind it
///
/// Keys are left in the KV store so a redelivered batch resolves them again;
/// they expire by TTL.
pub struct FallbackLaneHandler {
    lane: String,
    kv: Arc<dyn KvStore>,
    store: Arc<dyn LogStore>,
}

impl FallbackLaneHandler {
    pub fn new(lane: impl Into<String>, kv: Arc<dyn KvStore>, store: Arc<dyn LogStore>) -> Self {
        Self {
            lane: lane.into(),
            kv,
            store,
        }
    }

    async fn process(&self, key: &str) -> Result<()> {
        let raw = self
            .kv
            .get(key)
            .await?
            .ok_or_else(|| GatewayError::missing_payload(key))?;
        let payload: LogPayload = serde_json::from_str(&raw)?;
        apply_payload(self.store.as_ref(), &payload).await
    }
}

#[async_trait]
impl BatchHandler for FallbackLaneHandler {
    fn lane(&self) -> &str {
        &self.lane
    }

    async fn handle_batch(&self, messages: &[QueueMessage]) -> BatchOutcome {
        let mut failed = 0usize;

        for message in messages {
            let key = message.body.trim();
            if let Err(e) = self.process(key).await {
                warn!(lane = %self.lane, key, "Fallback message failed: {}", e);
                failed += 1;
            }
        }

        debug!(lane = %self.lane, total = messages.len(), failed, "Processed batch");
        if failed == 0 {
            BatchOutcome::Ack
        } else {
            BatchOutcome::Retry
        }
    }
}
