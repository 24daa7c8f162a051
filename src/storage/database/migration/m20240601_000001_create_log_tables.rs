//! Request, response and feedback tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RequestLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RequestLog::Id).string_len(64).not_null().primary_key())
                    .col(
                        ColumnDef::new(RequestLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RequestLog::Provider).string_len(100).not_null())
                    .col(ColumnDef::new(RequestLog::TargetUrl).text().not_null())
                    .col(ColumnDef::new(RequestLog::Method).string_len(16).not_null())
                    .col(ColumnDef::new(RequestLog::Path).text().not_null())
                    .col(ColumnDef::new(RequestLog::Body).text())
                    .col(ColumnDef::new(RequestLog::Model).string_len(200))
                    .col(ColumnDef::new(RequestLog::IsStream).boolean().not_null().default(false))
                    .col(ColumnDef::new(RequestLog::UserId).string_len(200))
                    .col(ColumnDef::new(RequestLog::Properties).json().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ResponseLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ResponseLog::Id).string_len(64).not_null().primary_key())
                    .col(ColumnDef::new(ResponseLog::RequestId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(ResponseLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ResponseLog::Provider).string_len(100).not_null())
                    .col(ColumnDef::new(ResponseLog::Status).integer().not_null())
                    .col(ColumnDef::new(ResponseLog::Body).text())
                    .col(ColumnDef::new(ResponseLog::Model).string_len(200))
                    .col(ColumnDef::new(ResponseLog::PromptTokens).big_integer())
                    .col(ColumnDef::new(ResponseLog::CompletionTokens).big_integer())
                    .col(ColumnDef::new(ResponseLog::Cost).double())
                    .col(ColumnDef::new(ResponseLog::DelayMs).big_integer().not_null())
                    .col(ColumnDef::new(ResponseLog::TimeToFirstTokenMs).big_integer())
                    .col(ColumnDef::new(ResponseLog::CompletionReason).string_len(16))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_response_log_request_id")
                    .table(ResponseLog::Table)
                    .col(ResponseLog::RequestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_response_log_created_at")
                    .table(ResponseLog::Table)
                    .col(ResponseLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ResponseFeedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResponseFeedback::ResponseId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ResponseFeedback::Rating).boolean().not_null())
                    .col(
                        ColumnDef::new(ResponseFeedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResponseFeedback::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResponseLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RequestLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RequestLog {
    Table,
    Id,
    CreatedAt,
    Provider,
    TargetUrl,
    Method,
    Path,
    Body,
    Model,
    IsStream,
    UserId,
    Properties,
}

#[derive(DeriveIden)]
enum ResponseLog {
    Table,
    Id,
    RequestId,
    CreatedAt,
    Provider,
    Status,
    Body,
    Model,
    PromptTokens,
    CompletionTokens,
    Cost,
    DelayMs,
    TimeToFirstTokenMs,
    CompletionReason,
}

#[derive(DeriveIden)]
enum ResponseFeedback {
    Table,
    ResponseId,
    Rating,
    CreatedAt,
}
