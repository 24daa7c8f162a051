//! Primary lane: tagged payloads carried inline

use super::handler::BatchHandler;
use super::types::{BatchOutcome, LogPayload, QueueMessage};
use crate::storage::LogStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Upsert one payload by its tag
pub(super) async fn apply_payload(store: &dyn LogStore, payload: &LogPayload) -> Result<()> {
    match payload {
        LogPayload::Request(record) => store.upsert_request(record).await,
        LogPayload::Response(record) => store.upsert_response(record).await,
    }
}

pub struct PrimaryLaneHandler {
    lane: String,
    store: Arc<dyn LogStore>,
}

impl PrimaryLaneHandler {
    pub fn new(lane: impl Into<String>, store: Arc<dyn LogStore>) -> Self {
        Self {
            lane: lane.into(),
            store,
        }
    }
}

#[async_trait]
impl BatchHandler for PrimaryLaneHandler {
    fn lane(&self) -> &str {
        &self.lane
    }

    async fn handle_batch(&self, messages: &[QueueMessage]) -> BatchOutcome {
        let mut failed = 0usize;

        for message in messages {
            let payload = match serde_json::from_str::<LogPayload>(&message.body) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(lane = %self.lane, message_id = %message.id, "Undecodable payload: {}", e);
                    failed += 1;
                    continue;
                }
            };
            if let Err(e) = apply_payload(self.store.as_ref(), &payload).await {
                warn!(
                    lane = %self.lane,
                    kind = payload.kind(),
                    id = payload.id(),
                    "Failed to write payload: {}",
                    e
                );
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
