//! Configuration management for the Gateway
//!
//! This module handles loading, validation, and management of all gateway configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the Gateway
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway configuration
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from file, then apply `METER_*` overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let gateway: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self {
            gateway: gateway.with_env_overrides()?,
        };

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let gateway = GatewayConfig::from_env()?;
        let config = Self { gateway };

        config.validate()?;
        Ok(config)
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.gateway.server
    }

    /// Get providers configuration
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.gateway.providers
    }

    /// Get storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.gateway.storage
    }

    /// Get queue configuration
    pub fn queue(&self) -> &QueueConfig {
        &self.gateway.queue
    }

    /// Get pricing configuration
    pub fn pricing(&self) -> &PricingConfig {
        &self.gateway.pricing
    }

    /// Get logging configuration
    pub fn logging(&self) -> &LoggingConfig {
        &self.gateway.logging
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        Validate::validate(&self.gateway)
            .map_err(|e| GatewayError::Config(format!("Invalid configuration: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.gateway)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_from_file() {
        let config_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
  workers: 4

providers:
  - name: "openai"
    base_url: "https://api.openai.com"
  - name: "local"
    base_url: "http://127.0.0.1:11434"

storage:
  database:
    url: "sqlite::memory:"
    enabled: true

queue:
  max_message_bytes: 1024
  lanes:
    primary: "logs"

pricing:
  rules_path: "config/costs.json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server().host, "127.0.0.1");
        assert_eq!(config.server().port, 8080);
        assert_eq!(config.providers().len(), 2);
        assert_eq!(config.providers()[1].name, "local");
        assert!(config.storage().database.enabled);
        assert_eq!(config.queue().max_message_bytes, 1024);
        assert_eq!(config.queue().lanes.primary, "logs");
        assert_eq!(config.queue().lanes.feedback, "response-feedback");
        assert_eq!(
            config.pricing().rules_path.as_deref(),
            Some("config/costs.json")
        );
    }

    #[tokio::test]
    async fn test_invalid_file_is_config_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"providers:\n  - name: \"a/b\"\n    base_url: \"https://x.io\"\n")
            .unwrap();

        let err = Config::from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();

        let yaml = config.to_yaml().unwrap();
        let parsed: GatewayConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.providers, config.gateway.providers);
    }
}
