//! Queue message and payload types

use crate::core::loggable::{RequestRecord, ResponseRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message read from a lane
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// Backend message id, used for acknowledgment
    pub id: String,
    pub body: String,
}

/// What to do with a batch once every message has been attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Acknowledge the whole batch
    Ack,
    /// Leave the whole batch pending for redelivery
    Retry,
}

/// Feedback for an already logged response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub response_id: String,
    pub rating: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Body of a feedback lane message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub feedback: FeedbackRecord,
}

/// Tagged payload carried on the primary lane or stored behind a fallback key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", content = "payload", rename_all = "lowercase")]
pub enum LogPayload {
    Request(RequestRecord),
    Response(ResponseRecord),
}

impl LogPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            LogPayload::Request(_) => "request",
            LogPayload::Response(_) => "response",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            LogPayload::Request(record) => &record.id,
            LogPayload::Response(record) => &record.id,
        }
    }
}
