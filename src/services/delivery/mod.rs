//! Delivery pipeline
//!
//! Records leave the request path through [`LogDispatcher`] and reach the
//! warehouse through one [`LaneWorker`] per lane. Every lane is
//! at-least-once: a batch is acknowledged only after it was applied, and all
//! warehouse writes are upserts so redelivery is harmless.

mod fallback;
mod feedback;
mod handler;
mod primary;
mod producer;
mod types;
mod worker;


pub use fallback::FallbackLaneHandler;
pub use feedback::FeedbackLaneHandler;
pub use handler::BatchHandler;
pub use primary::PrimaryLaneHandler;
pub use producer::{DispatchRoute, FALLBACK_KEY_PREFIX, LogDispatcher};
pub use types::{BatchOutcome, FeedbackMessage, FeedbackRecord, LogPayload, QueueMessage};
pub use worker::{DEAD_LETTER_SUFFIX, LaneWorker};

use crate::config::QueueConfig;
use crate::storage::StorageLayer;
use std::sync::Arc;

/// One worker per lane over the given storage
pub fn lane_workers(storage: &StorageLayer, config: &QueueConfig) -> Vec<Arc<LaneWorker>> {
    let handlers: Vec<Arc<dyn BatchHandler>> = vec![
        Arc::new(PrimaryLaneHandler::new(
            config.lanes.primary.clone(),
            storage.log_store.clone(),
        )),
        Arc::new(FallbackLaneHandler::new(
            config.lanes.fallback.clone(),
            storage.kv.clone(),
            storage.log_store.clone(),
        )),
        Arc::new(FeedbackLaneHandler::new(
            config.lanes.feedback.clone(),
            storage.log_store.clone(),
        )),
    ];

    handlers
        .into_iter()
        .map(|handler| Arc::new(LaneWorker::new(storage.queue.clone(), handler, config)))
        .collect()
}
