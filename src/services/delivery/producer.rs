//! Producer side of the delivery lanes

use super::types::{FeedbackMessage, FeedbackRecord, LogPayload};
use crate::config::{LaneNames, QueueConfig};
use crate::core::loggable::{RequestRecord, ResponseRecord};
use crate::storage::{KvStore, MessageQueue};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Prefix of KV keys holding oversized payloads
pub const FALLBACK_KEY_PREFIX: &str = "meter-fallback:";

/// Where a payload was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchRoute {
    /// Carried inline on the primary lane
    Primary { message_id: String },
    /// Stored under `key`, the key sent on the fallback lane
    Fallback { key: String, message_id: String },
}

/// Routes log payloads to the primary or fallback lane by size
#[derive(Clone)]
pub struct LogDispatcher {
    queue: Arc<dyn MessageQueue>,
    kv: Arc<dyn KvStore>,
    lanes: LaneNames,
    max_message_bytes: usize,
    fallback_ttl: Duration,
}

impl std::fmt::Debug for LogDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogDispatcher")
            .field("lanes", &self.lanes)
            .field("max_message_bytes", &self.max_message_bytes)
            .finish_non_exhaustive()
    }
}

impl LogDispatcher {
    pub fn new(queue: Arc<dyn MessageQueue>, kv: Arc<dyn KvStore>, config: &QueueConfig) -> Self {
        Self {
            queue,
            kv,
            lanes: config.lanes.clone(),
            max_message_bytes: config.max_message_bytes,
            fallback_ttl: config.fallback_ttl(),
        }
    }

    /// Send one payload
    ///
    /// Payloads above `max_message_bytes` go to the KV store first and only
    /// their key travels on the fallback lane.
    pub async fn dispatch(&self, payload: &LogPayload) -> Result<DispatchRoute> {
        let body = serde_json::to_string(payload)?;

        if body.len() <= self.max_message_bytes {
            let message_id = self.queue.publish(&self.lanes.primary, &body).await?;
            debug!(kind = payload.kind(), id = payload.id(), "Payload sent on primary lane");
            return Ok(DispatchRoute::Primary { message_id });
        }

        let key = format!("{}{}", FALLBACK_KEY_PREFIX, Uuid::new_v4());
        self.kv.put(&key, &body, self.fallback_ttl).await?;
        let message_id = self.queue.publish(&self.lanes.fallback, &key).await?;
        debug!(
            kind = payload.kind(),
            id = payload.id(),
            bytes = body.len(),
            key = %key,
            "Oversized payload sent on fallback lane"
        );
        Ok(DispatchRoute::Fallback { key, message_id })
    }

    /// Send the request record, then the response record
    pub async fn dispatch_records(
        &self,
        request: RequestRecord,
        response: ResponseRecord,
    ) -> Result<(DispatchRoute, DispatchRoute)> {
        let request_route = self.dispatch(&LogPayload::Request(request)).await?;
        let response_route = self.dispatch(&LogPayload::Response(response)).await?;
        Ok((request_route, response_route))
    }

    /// Enqueue feedback on the feedback lane
    pub async fn submit_feedback(&self, feedback: FeedbackRecord) -> Result<String> {
        let body = serde_json::to_string(&FeedbackMessage { feedback })?;
        self.queue.publish(&self.lanes.feedback, &body).await
    }
}
