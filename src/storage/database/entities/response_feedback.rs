use crate::services::delivery::FeedbackRecord;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Latest feedback for a response
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "response_feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub response_id: String,

    pub rating: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FeedbackRecord> for ActiveModel {
    fn from(record: &FeedbackRecord) -> Self {
        Self {
            response_id: Set(record.response_id.clone()),
            rating: Set(record.rating),
            created_at: Set(record.created_at.into()),
        }
    }
}
