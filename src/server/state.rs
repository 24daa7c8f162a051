//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::proxy::RequestForwarder;
use crate::services::delivery::LogDispatcher;
use crate::services::pricing::PricingService;
use crate::storage::StorageLayer;
use crate::utils::error::Result;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Every service client is built once at startup and injected here.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Storage layer
    pub storage: Arc<StorageLayer>,
    /// Active cost rules
    pub pricing: Arc<PricingService>,
    /// Outbound client
    pub forwarder: RequestForwarder,
    /// Queue producer for finished records and feedback
    pub dispatcher: LogDispatcher,
}

impl AppState {
    pub fn new(config: Config, storage: StorageLayer, pricing: PricingService) -> Result<Self> {
        let forwarder = RequestForwarder::new(config.server().upstream_connect_timeout())?;
        let dispatcher =
            LogDispatcher::new(storage.queue.clone(), storage.kv.clone(), config.queue());
        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            pricing: Arc::new(pricing),
            forwarder,
            dispatcher,
        })
    }
}
