//! Lane polling loop

use super::handler::BatchHandler;
use super::types::{BatchOutcome, QueueMessage};
use crate::config::QueueConfig;
use crate::storage::MessageQueue;
use crate::utils::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Suffix of the dead-letter lane for a lane
pub const DEAD_LETTER_SUFFIX: &str = "-dlq";

/// Polls one lane and acknowledges batches the handler accepts
///
/// Delivery counts are tracked per message id in this process. A message
/// seen more than `max_deliveries` times is copied to `<lane>-dlq` and
/// acknowledged instead of being handed to the handler again.
pub struct LaneWorker {
    queue: Arc<dyn MessageQueue>,
    handler: Arc<dyn BatchHandler>,
    batch_size: usize,
    poll_interval: Duration,
    retry_delay: Duration,
    max_deliveries: u32,
    deliveries: DashMap<String, u32>,
    active: AtomicBool,
}

impl LaneWorker {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        handler: Arc<dyn BatchHandler>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            batch_size: config.batch_size.max(1),
            poll_interval: config.poll_interval(),
            retry_delay: config.retry_delay(),
            max_deliveries: config.max_deliveries,
            deliveries: DashMap::new(),
            active: AtomicBool::new(true),
        }
    }

    pub fn lane(&self) -> &str {
        self.handler.lane()
    }

    pub fn dead_letter_lane(&self) -> String {
        format!("{}{}", self.lane(), DEAD_LETTER_SUFFIX)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop after the current batch
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Read and process one batch; `None` when the lane is empty
    pub async fn run_once(&self) -> Result<Option<BatchOutcome>> {
        let lane = self.lane().to_string();
        let messages = self.queue.read(&lane, self.batch_size).await?;
        if messages.is_empty() {
            return Ok(None);
        }

        let (live, dead) = self.partition(messages);
        if !dead.is_empty() {
            self.dead_letter(&lane, &dead).await?;
        }
        if live.is_empty() {
            return Ok(Some(BatchOutcome::Ack));
        }

        let outcome = self.handler.handle_batch(&live).await;
        match outcome {
            BatchOutcome::Ack => {
                let ids: Vec<String> = live.iter().map(|m| m.id.clone()).collect();
                self.queue.ack(&lane, &ids).await?;
                for id in &ids {
                    self.deliveries.remove(id);
                }
                debug!(lane = %lane, count = ids.len(), "Batch acknowledged");
            }
            BatchOutcome::Retry => {
                warn!(lane = %lane, count = live.len(), "Batch left pending for redelivery");
            }
        }
        Ok(Some(outcome))
    }

    fn partition(&self, messages: Vec<QueueMessage>) -> (Vec<QueueMessage>, Vec<QueueMessage>) {
        messages.into_iter().partition(|message| {
            let mut count = self.deliveries.entry(message.id.clone()).or_insert(0);
            *count += 1;
            *count <= self.max_deliveries
        })
    }

    async fn dead_letter(&self, lane: &str, messages: &[QueueMessage]) -> Result<()> {
        let dlq = self.dead_letter_lane();
        for message in messages {
            self.queue.publish(&dlq, &message.body).await?;
        }
        let ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
        self.queue.ack(lane, &ids).await?;
        for id in &ids {
            self.deliveries.remove(id);
        }
        error!(
            lane = %lane,
            dead_letter_lane = %dlq,
            count = ids.len(),
            "Messages exceeded {} deliveries and were dead-lettered",
            self.max_deliveries
        );
        Ok(())
    }

    /// Poll until stopped
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(lane = %self.lane(), "Lane worker started");
            while self.is_active() {
                let wait = match self.run_once().await {
                    Ok(None) => Some(self.poll_interval),
                    Ok(Some(BatchOutcome::Ack)) => None,
                    Ok(Some(BatchOutcome::Retry)) => Some(self.retry_delay),
                    Err(e) => {
                        error!(lane = %self.lane(), "Lane poll failed: {}", e);
                        Some(self.retry_delay)
                    }
                };
                if let Some(wait) = wait {
                    tokio::time::sleep(wait).await;
                }
            }
            info!(lane = %self.lane(), "Lane worker stopped");
        })
    }
}
