//! Main gateway configuration

#![allow(missing_docs)]

use super::*;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream providers, addressed by name in the proxy route
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Delivery queue configuration
    #[serde(default)]
    pub queue: QueueConfig,
    /// Pricing configuration
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: default_providers(),
            storage: StorageConfig::default(),
            queue: QueueConfig::default(),
            pricing: PricingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Defaults with `METER_*` environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `METER_*` environment variables on top of this configuration
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("METER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("METER_PORT") {
            self.server.port = parse_env("METER_PORT", &port)?;
        }
        if let Some(timeout) = lookup("METER_TIMEOUT") {
            self.server.timeout = parse_env("METER_TIMEOUT", &timeout)?;
        }
        if let Some(url) = lookup("METER_DATABASE_URL") {
            self.storage.database.url = url;
            self.storage.database.enabled = true;
        }
        if let Some(url) = lookup("METER_REDIS_URL") {
            self.storage.redis.url = url;
            self.storage.redis.enabled = true;
        }
        if let Some(path) = lookup("METER_PRICING_RULES") {
            self.pricing.rules_path = Some(path);
        }
        if let Some(level) = lookup("METER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("METER_LOG_JSON") {
            self.logging.json = parse_env("METER_LOG_JSON", &json)?;
        }
        if let Some(bytes) = lookup("METER_MAX_MESSAGE_BYTES") {
            self.queue.max_message_bytes = parse_env("METER_MAX_MESSAGE_BYTES", &bytes)?;
        }
        if let Some(providers) = lookup("METER_PROVIDERS") {
            let overrides = parse_provider_list(&providers)?;
            self.providers = merge_providers(self.providers, overrides);
        }
        Ok(self)
    }

    /// Get provider by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name && p.enabled)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::Config(format!("Invalid value for {}: {}", key, value)))
}

/// Parses `name=url,name=url`
fn parse_provider_list(value: &str) -> Result<Vec<ProviderConfig>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, base_url) = entry.split_once('=').ok_or_else(|| {
                GatewayError::Config(format!("Invalid provider entry: {}", entry))
            })?;
            Ok(ProviderConfig::new(name.trim(), base_url.trim()))
        })
        .collect()
}

fn merge_providers(base: Vec<ProviderConfig>, other: Vec<ProviderConfig>) -> Vec<ProviderConfig> {
    let mut order: Vec<String> = base.iter().map(|p| p.name.clone()).collect();
    let mut by_name: HashMap<String, ProviderConfig> =
        base.into_iter().map(|p| (p.name.clone(), p)).collect();

    for provider in other {
        if !by_name.contains_key(&provider.name) {
            order.push(provider.name.clone());
        }
        by_name.insert(provider.name.clone(), provider);
    }

    order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect()
}

/// Providers available out of the box
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("openai", "https://api.openai.com"),
        ProviderConfig::new("anthropic", "https://api.anthropic.com"),
    ]
}
