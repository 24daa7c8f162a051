//! Redis storage implementation
//!
//! - `pool` - Connection management and health checks
//! - `cache` - Expiring key/value operations for fallback payloads
//! - `streams` - Queue lanes on Redis Streams consumer groups

mod cache;
mod pool;
mod streams;

pub use pool::RedisPool;
pub use streams::RedisStreamQueue;
