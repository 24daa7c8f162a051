//! Feedback lane: ratings for already logged responses

use super::handler::BatchHandler;
use super::types::{BatchOutcome, FeedbackMessage, QueueMessage};
use crate::storage::LogStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Applies a whole batch as one transactional upsert
pub struct FeedbackLaneHandler {
    lane: String,
    store: Arc<dyn LogStore>,
}

impl FeedbackLaneHandler {
    pub fn new(lane: impl Into<String>, store: Arc<dyn LogStore>) -> Self {
        Self {
            lane: lane.into(),
            store,
        }
    }
}

#[async_trait]
impl BatchHandler for FeedbackLaneHandler {
    fn lane(&self) -> &str {
        &self.lane
    }

    async fn handle_batch(&self, messages: &[QueueMessage]) -> BatchOutcome {
        let records: Vec<_> = messages
            .iter()
            .filter_map(
                |message| match serde_json::from_str::<FeedbackMessage>(&message.body) {
                    Ok(decoded) => Some(decoded.feedback),
                    Err(e) => {
                        warn!(
                            lane = %self.lane,
                            message_id = %message.id,
                            "Skipping undecodable feedback: {}",
                            e
                        );
                        None
                    }
                },
            )
            .collect();

        if records.is_empty() {
            return BatchOutcome::Ack;
        }

        match self.store.upsert_feedback_batch(&records).await {
            Ok(()) => {
                debug!(lane = %self.lane, count = records.len(), "Applied feedback batch");
                BatchOutcome::Ack
            }
            Err(e) => {
                error!(lane = %self.lane, count = records.len(), "Feedback batch failed: {}", e);
                BatchOutcome::Retry
            }
        }
    }
}
