//! Pricing service holding the active cost registry

use super::registry::CostRegistry;
use super::sql::{SqlDialect, compile_aggregate_expression};
use super::types::{CostQuery, CostResult};
use crate::config::PricingConfig;
use crate::utils::error::Result;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Shared handle to the active registry
///
/// Readers take a cheap snapshot; `reload` swaps in a freshly parsed file.
#[derive(Debug, Clone)]
pub struct PricingService {
    registry: Arc<RwLock<Arc<CostRegistry>>>,
    source: Option<PathBuf>,
}

impl PricingService {
    /// Service over an already built registry
    pub fn new(registry: CostRegistry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Arc::new(registry))),
            source: None,
        }
    }

    /// Load the configured rule file, or the built-in tables
    pub async fn from_config(config: &PricingConfig) -> Result<Self> {
        match &config.rules_path {
            Some(path) => {
                let registry = CostRegistry::load_from_file(path).await?;
                info!(
                    "Pricing service initialized with {} rules from {}",
                    registry.rule_count(),
                    path
                );
                Ok(Self {
                    registry: Arc::new(RwLock::new(Arc::new(registry))),
                    source: Some(PathBuf::from(path)),
                })
            }
            None => {
                let registry = CostRegistry::builtin()?;
                info!(
                    "Pricing service initialized with {} built-in rules",
                    registry.rule_count()
                );
                Ok(Self::new(registry))
            }
        }
    }

    /// Current registry
    pub fn snapshot(&self) -> Arc<CostRegistry> {
        self.registry.read().clone()
    }

    /// Re-read the rule file; the previous registry stays active on failure
    pub async fn reload(&self) -> Result<bool> {
        let Some(path) = &self.source else {
            return Ok(false);
        };
        let registry = CostRegistry::load_from_file(path).await?;
        *self.registry.write() = Arc::new(registry);
        info!("Pricing rules reloaded from {:?}", path);
        Ok(true)
    }

    pub fn cost(&self, query: &CostQuery) -> CostResult {
        let registry = self.snapshot();
        let pricing = registry.lookup(&query.provider, &query.model).copied();
        CostResult {
            provider: query.provider.clone(),
            model: query.model.clone(),
            cost: pricing.map(|p| {
                p.cost(
                    query.prompt_tokens,
                    query.completion_tokens,
                    query.images,
                    query.per_call,
                )
            }),
            pricing,
        }
    }

    pub fn aggregate_sql(&self, table: &str, dialect: SqlDialect) -> Result<String> {
        compile_aggregate_expression(&self.snapshot(), table, dialect)
    }
}
