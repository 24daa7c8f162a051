use crate::core::loggable::ResponseRecord;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Priced response of a proxied request
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "response_log")]
pub struct Model {
    /// Response ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub request_id: String,

    pub created_at: DateTimeWithTimeZone,

    pub provider: String,

    /// Normalized status; -3 cancelled, -2 timed out, -100 errored
    pub status: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,

    pub model: Option<String>,

    pub prompt_tokens: Option<i64>,

    pub completion_tokens: Option<i64>,

    pub cost: Option<f64>,

    pub delay_ms: i64,

    pub time_to_first_token_ms: Option<i64>,

    pub completion_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ResponseRecord> for ActiveModel {
    fn from(record: &ResponseRecord) -> Self {
        Self {
            id: Set(record.id.clone()),
            request_id: Set(record.request_id.clone()),
            created_at: Set(record.created_at.into()),
            provider: Set(record.provider.clone()),
            status: Set(record.status),
            body: Set(record.body.clone()),
            model: Set(record.model.clone()),
            prompt_tokens: Set(record.prompt_tokens),
            completion_tokens: Set(record.completion_tokens),
            cost: Set(record.cost),
            delay_ms: Set(record.delay_ms),
            time_to_first_token_ms: Set(record.time_to_first_token_ms),
            completion_reason: Set(record.completion_reason.clone()),
        }
    }
}
