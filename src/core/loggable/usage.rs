//! Token usage extraction from provider response bodies

use serde_json::Value;

/// Usage and model reported by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub model: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
}

impl Usage {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.prompt_tokens.is_none() && self.completion_tokens.is_none()
    }

    fn absorb(&mut self, value: &Value) {
        if self.model.is_none() {
            if let Some(model) = value.get("model").and_then(Value::as_str) {
                self.model = Some(model.to_string());
            }
        }

        // anthropic `message_start` nests the message
        if let Some(message) = value.get("message").filter(|m| m.is_object()) {
            self.absorb(message);
        }

        if let Some(usage) = value.get("usage").filter(|u| u.is_object()) {
            if let Some(prompt) = token_count(usage, &["prompt_tokens", "input_tokens"]) {
                self.prompt_tokens = Some(prompt);
            }
            if let Some(completion) =
                token_count(usage, &["completion_tokens", "output_tokens"])
            {
                self.completion_tokens = Some(completion);
            }
        }
    }
}

fn token_count(usage: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| usage.get(*k).and_then(Value::as_i64))
}

/// Extract usage from a JSON body or an SSE stream
///
/// Later events override earlier counts, so a stream that reports input
/// tokens up front and output tokens at the end yields both.
pub fn extract_usage(body: &str) -> Usage {
    let mut usage = Usage::default();
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return usage;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        usage.absorb(&value);
        return usage;
    }

    for line in trimmed.lines() {
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(data) {
            usage.absorb(&value);
        }
    }
    usage
}
