use crate::core::loggable::{RequestRecord, ResponseRecord};
use crate::services::delivery::FeedbackRecord;
use crate::storage::traits::LogStore;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, request_log, response_feedback, response_log};
use super::types::SeaOrmDatabase;

impl SeaOrmDatabase {
    /// Find a response row by id
    pub async fn find_response(&self, id: &str) -> Result<Option<response_log::Model>> {
        entities::ResponseLog::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)
    }

    /// Find a request row by id
    pub async fn find_request(&self, id: &str) -> Result<Option<request_log::Model>> {
        entities::RequestLog::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)
    }

    /// Find the feedback row of a response
    pub async fn find_feedback(&self, response_id: &str) -> Result<Option<response_feedback::Model>> {
        entities::ResponseFeedback::find_by_id(response_id.to_string())
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)
    }
}

#[async_trait]
impl LogStore for SeaOrmDatabase {
    async fn upsert_request(&self, record: &RequestRecord) -> Result<()> {
        debug!("Upserting request {}", record.id);

        entities::RequestLog::insert(request_log::ActiveModel::from(record))
            .on_conflict(
                OnConflict::column(request_log::Column::Id)
                    .update_columns([
                        request_log::Column::CreatedAt,
                        request_log::Column::Provider,
                        request_log::Column::TargetUrl,
                        request_log::Column::Method,
                        request_log::Column::Path,
                        request_log::Column::Body,
                        request_log::Column::Model,
                        request_log::Column::IsStream,
                        request_log::Column::UserId,
                        request_log::Column::Properties,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(())
    }

    async fn upsert_response(&self, record: &ResponseRecord) -> Result<()> {
        debug!("Upserting response {}", record.id);

        entities::ResponseLog::insert(response_log::ActiveModel::from(record))
            .on_conflict(
                OnConflict::column(response_log::Column::Id)
                    .update_columns([
                        response_log::Column::RequestId,
                        response_log::Column::CreatedAt,
                        response_log::Column::Provider,
                        response_log::Column::Status,
                        response_log::Column::Body,
                        response_log::Column::Model,
                        response_log::Column::PromptTokens,
                        response_log::Column::CompletionTokens,
                        response_log::Column::Cost,
                        response_log::Column::DelayMs,
                        response_log::Column::TimeToFirstTokenMs,
                        response_log::Column::CompletionReason,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(())
    }

    async fn upsert_feedback_batch(&self, records: &[FeedbackRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!("Applying {} feedback records", records.len());

        let txn = self.db.begin().await.map_err(GatewayError::Database)?;

        // Feedback only attaches to responses that are already logged
        for record in records {
            let exists = entities::ResponseLog::find_by_id(record.response_id.clone())
                .one(&txn)
                .await
                .map_err(GatewayError::Database)?
                .is_some();
            if !exists {
                txn.rollback().await.map_err(GatewayError::Database)?;
                return Err(GatewayError::batch_apply(format!(
                    "Response {} not logged",
                    record.response_id
                )));
            }
        }

        // One row per response; the last record in the batch wins
        let mut latest: Vec<&FeedbackRecord> = Vec::with_capacity(records.len());
        for record in records {
            match latest.iter_mut().find(|r| r.response_id == record.response_id) {
                Some(slot) => *slot = record,
                None => latest.push(record),
            }
        }

        entities::ResponseFeedback::insert_many(
            latest.into_iter().map(response_feedback::ActiveModel::from),
        )
        .on_conflict(
            OnConflict::column(response_feedback::Column::ResponseId)
                .update_columns([
                    response_feedback::Column::Rating,
                    response_feedback::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(GatewayError::Database)?;

        txn.commit().await.map_err(GatewayError::Database)?;
        Ok(())
    }
}
