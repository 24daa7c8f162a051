use crate::core::loggable::RequestRecord;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Proxied request
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "request_log")]
pub struct Model {
    /// Request ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub created_at: DateTimeWithTimeZone,

    pub provider: String,

    pub target_url: String,

    pub method: String,

    pub path: String,

    /// Raw request body, absent when omitted
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,

    pub model: Option<String>,

    pub is_stream: bool,

    pub user_id: Option<String>,

    /// Custom properties (JSON object)
    pub properties: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RequestRecord> for ActiveModel {
    fn from(record: &RequestRecord) -> Self {
        Self {
            id: Set(record.id.clone()),
            created_at: Set(record.created_at.into()),
            provider: Set(record.provider.clone()),
            target_url: Set(record.target_url.clone()),
            method: Set(record.method.clone()),
            path: Set(record.path.clone()),
            body: Set(record.body.clone()),
            model: Set(record.model.clone()),
            is_stream: Set(record.is_stream),
            user_id: Set(record.user_id.clone()),
            properties: Set(serde_json::to_value(&record.properties).unwrap_or_default()),
        }
    }
}
