//! Configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        self.server.validate()?;

        if self.providers.is_empty() {
            return Err("At least one provider must be configured".to_string());
        }

        let mut provider_names = HashSet::new();
        for provider in &self.providers {
            if !provider_names.insert(&provider.name) {
                return Err(format!("Duplicate provider name: {}", provider.name));
            }
            provider.validate()?;
        }

        self.storage.validate()?;
        self.queue.validate()?;
        self.logging.validate()?;

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Server host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err("Worker count must be greater than 0".to_string());
            }
            if workers > 1000 {
                return Err("Worker count seems too high (>1000)".to_string());
            }
        }

        if self.timeout == 0 {
            return Err("Server timeout must be greater than 0".to_string());
        }

        if self.connect_timeout == 0 {
            return Err("Upstream connect timeout must be greater than 0".to_string());
        }

        if self.max_body_size == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }

        if self.retry_limits.min_timeout.is_zero() {
            return Err("Retry min_timeout must be greater than 0".to_string());
        }

        if self.retry_limits.min_timeout > self.retry_limits.max_timeout {
            return Err("Retry min_timeout cannot exceed max_timeout".to_string());
        }

        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }

        if self.name.contains('/') {
            return Err(format!(
                "Provider name cannot contain '/': {}",
                self.name
            ));
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| {
            format!("Invalid base URL for provider {}: {}", self.name, e)
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Provider {} base URL must use http or https",
                self.name
            ));
        }

        Ok(())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.database.enabled {
            if self.database.url.is_empty() {
                return Err("Database URL is required".to_string());
            }
            if self.database.max_connections == 0 {
                return Err("Database max connections must be greater than 0".to_string());
            }
        }

        if self.redis.enabled {
            if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://")
            {
                return Err("Redis URL must start with redis:// or rediss://".to_string());
            }
            if self.redis.max_connections == 0 {
                return Err("Redis max connections must be greater than 0".to_string());
            }
        }

        Ok(())
    }
}

impl Validate for QueueConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_message_bytes == 0 {
            return Err("Max message bytes must be greater than 0".to_string());
        }

        if self.batch_size == 0 {
            return Err("Batch size must be greater than 0".to_string());
        }

        if self.max_deliveries == 0 {
            return Err("Max deliveries must be greater than 0".to_string());
        }

        if self.fallback_ttl_secs == 0 {
            return Err("Fallback TTL must be greater than 0".to_string());
        }

        if self.consumer_group.is_empty() {
            return Err("Consumer group cannot be empty".to_string());
        }

        let lanes = [
            &self.lanes.primary,
            &self.lanes.fallback,
            &self.lanes.feedback,
        ];
        if lanes.iter().any(|lane| lane.is_empty()) {
            return Err("Lane names cannot be empty".to_string());
        }
        let unique: HashSet<_> = lanes.iter().collect();
        if unique.len() != lanes.len() {
            return Err("Lane names must be distinct".to_string());
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| format!("Invalid log level '{}': {}", self.level, e))
    }
}
