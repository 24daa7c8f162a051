//! Storage layer for the Gateway
//!
//! Warehouse writes go through [`LogStore`], oversized payloads through
//! [`KvStore`] and delivery lanes through [`MessageQueue`]. Each backend is
//! either a real service or its in-memory stand-in, chosen from config.

/// Database storage module
pub mod database;
/// In-memory backends
pub mod memory;
/// Redis KV and stream lanes
#[cfg(feature = "redis")]
pub mod redis;
/// Backend traits
pub mod traits;

pub use traits::{KvStore, LogStore, MessageQueue};

use crate::config::{QueueConfig, StorageConfig};
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Explicitly constructed backends shared through the application state
#[derive(Clone)]
pub struct StorageLayer {
    pub log_store: Arc<dyn LogStore>,
    pub kv: Arc<dyn KvStore>,
    pub queue: Arc<dyn MessageQueue>,
    /// Database handle, when a warehouse is configured
    pub database: Option<Arc<database::Database>>,
    #[cfg(feature = "redis")]
    pub redis: Option<redis::RedisPool>,
}

impl std::fmt::Debug for StorageLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageLayer")
            .field("database", &self.database.is_some())
            .finish_non_exhaustive()
    }
}

impl StorageLayer {
    /// Create a new storage layer
    pub async fn new(config: &StorageConfig, queue: &QueueConfig) -> Result<Self> {
        info!("Initializing storage layer");

        let (log_store, database) = if config.database.enabled {
            debug!("Connecting to database");
            let db = Arc::new(database::Database::new(&config.database).await?);
            db.migrate().await?;
            (db.clone() as Arc<dyn LogStore>, Some(db))
        } else {
            warn!("Database disabled, records are kept in memory only");
            (
                Arc::new(memory::MemoryLogStore::new()) as Arc<dyn LogStore>,
                None,
            )
        };

        #[cfg(feature = "redis")]
        if config.redis.enabled {
            debug!("Connecting to Redis");
            let pool = redis::RedisPool::new(&config.redis).await?;
            let consumer = queue
                .consumer_name
                .clone()
                .unwrap_or_else(|| format!("gateway-{}", uuid::Uuid::new_v4()));
            let stream_queue =
                redis::RedisStreamQueue::new(pool.clone(), queue.consumer_group.clone(), consumer);

            return Ok(Self {
                log_store,
                kv: Arc::new(pool.clone()),
                queue: Arc::new(stream_queue),
                database,
                redis: Some(pool),
            });
        }

        #[cfg(not(feature = "redis"))]
        if config.redis.enabled {
            warn!("Redis support not compiled in, using in-memory queue");
        }
        let _ = queue;

        warn!("Redis disabled, using in-memory KV store and queue");
        Ok(Self {
            log_store,
            kv: Arc::new(memory::MemoryKv::new()),
            queue: Arc::new(memory::MemoryQueue::new()),
            database,
            #[cfg(feature = "redis")]
            redis: None,
        })
    }

    /// Storage backed entirely by the given in-memory parts
    pub fn in_memory(
        log_store: Arc<memory::MemoryLogStore>,
        kv: Arc<memory::MemoryKv>,
        queue: Arc<memory::MemoryQueue>,
    ) -> Self {
        Self {
            log_store,
            kv,
            queue,
            database: None,
            #[cfg(feature = "redis")]
            redis: None,
        }
    }

    /// Check every configured backend
    pub async fn health_check(&self) -> Result<()> {
        if let Some(db) = &self.database {
            db.health_check().await?;
        }
        #[cfg(feature = "redis")]
        if let Some(pool) = &self.redis {
            pool.health_check().await?;
        }
        Ok(())
    }
}
