//! Key/value operations backing the fallback lane

use super::pool::RedisPool;
use crate::storage::traits::KvStore;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

#[async_trait]
impl KvStore for RedisPool {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.get_connection();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(GatewayError::Redis)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection();
        let value: Option<String> = conn.get(key).await.map_err(GatewayError::Redis)?;
        Ok(value)
    }
}
