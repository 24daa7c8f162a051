//! Lane handler seam

use super::types::{BatchOutcome, QueueMessage};
use async_trait::async_trait;

/// Processes one batch of a lane
///
/// Every message is attempted before the outcome is decided, and the outcome
/// applies to the whole batch.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    /// Lane this handler consumes
    fn lane(&self) -> &str;

    async fn handle_batch(&self, messages: &[QueueMessage]) -> BatchOutcome;
}
