//! Record factories
//!
//! Every factory returns a real record, ready for the queue or the warehouse.

use chrono::{Duration, Utc};
use llm_meter::core::loggable::{RequestRecord, ResponseRecord};
use llm_meter::services::delivery::FeedbackRecord;
use std::collections::BTreeMap;
use uuid::Uuid;

pub struct RecordFactory;

impl RecordFactory {
    /// A chat completion request to openai
    pub fn request(id: &str) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            created_at: Utc::now(),
            provider: "openai".to_string(),
            target_url: "https://api.openai.com/v1/chat/completions".to_string(),
            method: "POST".to_string(),
            path: "/v1/chat/completions".to_string(),
            body: Some(r#"{"model":"gpt-4","messages":[]}"#.to_string()),
            model: Some("gpt-4".to_string()),
            is_stream: false,
            user_id: None,
            properties: BTreeMap::new(),
        }
    }

    /// A successful response to `request_id`
    pub fn response(request_id: &str) -> ResponseRecord {
        Self::priced(request_id, "openai", "gpt-4-0613", 100, 50)
    }

    /// A response with the given usage and no cost filled in
    pub fn priced(
        request_id: &str,
        provider: &str,
        model: &str,
        prompt_tokens: i64,
        completion_tokens: i64,
    ) -> ResponseRecord {
        let created_at = Utc::now();
        ResponseRecord {
            id: Uuid::new_v4().to_string(),
            request_id: request_id.to_string(),
            created_at,
            provider: provider.to_string(),
            status: 200,
            body: Some("{}".to_string()),
            model: Some(model.to_string()),
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            cost: None,
            delay_ms: 420,
            time_to_first_token_ms: Some(120),
            completion_reason: Some("done".to_string()),
        }
    }

    pub fn feedback(response_id: &str, rating: bool) -> FeedbackRecord {
        FeedbackRecord {
            response_id: response_id.to_string(),
            rating,
            created_at: Utc::now() - Duration::seconds(1),
        }
    }
}
