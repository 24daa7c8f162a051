//! Queue lanes on Redis Streams consumer groups

use super::pool::RedisPool;
use crate::services::delivery::QueueMessage;
use crate::storage::traits::MessageQueue;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use dashmap::DashSet;
use redis::AsyncCommands;
use redis::streams::{StreamReadOptions, StreamReadReply};
use tracing::debug;

const BODY_FIELD: &str = "body";

/// One consumer of a consumer group
///
/// Reads start with id `0`, which returns this consumer's pending entries;
/// only when none are pending are new entries claimed with `>`.
#[derive(Debug)]
pub struct RedisStreamQueue {
    pool: RedisPool,
    group: String,
    consumer: String,
    known_groups: DashSet<String>,
}

impl RedisStreamQueue {
    pub fn new(pool: RedisPool, group: impl Into<String>, consumer: impl Into<String>) -> Self {
        Self {
            pool,
            group: group.into(),
            consumer: consumer.into(),
            known_groups: DashSet::new(),
        }
    }

    async fn ensure_group(&self, lane: &str) -> Result<()> {
        if self.known_groups.contains(lane) {
            return Ok(());
        }

        let mut conn = self.pool.get_connection();
        let created: redis::RedisResult<()> =
            conn.xgroup_create_mkstream(lane, &self.group, "0").await;
        match created {
            Ok(()) => debug!("Created consumer group {} on {}", self.group, lane),
            Err(e) if e.code() == Some("BUSYGROUP") => {}
            Err(e) => return Err(GatewayError::Redis(e)),
        }

        self.known_groups.insert(lane.to_string());
        Ok(())
    }

    async fn read_from(&self, lane: &str, start: &str, max: usize) -> Result<Vec<QueueMessage>> {
        let mut conn = self.pool.get_connection();
        let options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(max);

        let reply: Option<StreamReadReply> = conn
            .xread_options(&[lane], &[start], &options)
            .await
            .map_err(GatewayError::Redis)?;

        Ok(reply.map(messages_from_reply).unwrap_or_default())
    }
}

/// Entries trimmed from the stream come back without fields and get an empty body
fn messages_from_reply(reply: StreamReadReply) -> Vec<QueueMessage> {
    reply
        .keys
        .into_iter()
        .flat_map(|key| key.ids)
        .map(|entry| QueueMessage {
            body: entry.get::<String>(BODY_FIELD).unwrap_or_default(),
            id: entry.id,
        })
        .collect()
}

#[async_trait]
impl MessageQueue for RedisStreamQueue {
    async fn publish(&self, lane: &str, body: &str) -> Result<String> {
        self.ensure_group(lane).await?;
        let mut conn = self.pool.get_connection();
        let id: String = conn
            .xadd(lane, "*", &[(BODY_FIELD, body)])
            .await
            .map_err(GatewayError::Redis)?;
        Ok(id)
    }

    async fn read(&self, lane: &str, max: usize) -> Result<Vec<QueueMessage>> {
        self.ensure_group(lane).await?;

        let pending = self.read_from(lane, "0", max).await?;
        if !pending.is_empty() {
            return Ok(pending);
        }
        self.read_from(lane, ">", max).await
    }

    async fn ack(&self, lane: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get_connection();
        let _: i64 = conn
            .xack(lane, &self.group, ids)
            .await
            .map_err(GatewayError::Redis)?;
        Ok(())
    }
}
