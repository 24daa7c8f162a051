//! Insert-ready warehouse records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of `request_log`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub provider: String,
    pub target_url: String,
    pub method: String,
    pub path: String,
    /// `None` when the caller asked to omit the request body
    pub body: Option<String>,
    pub model: Option<String>,
    pub is_stream: bool,
    pub user_id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// One row of `response_log`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: String,
    pub request_id: String,
    pub created_at: DateTime<Utc>,
    /// Cost table name the row is priced under
    pub provider: String,
    /// Normalized status, negative for abnormal terminations
    pub status: i32,
    pub body: Option<String>,
    pub model: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub cost: Option<f64>,
    pub delay_ms: i64,
    pub time_to_first_token_ms: Option<i64>,
    pub completion_reason: Option<String>,
}
