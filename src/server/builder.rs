//! Server builder and run_server function

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use tracing::{info, warn};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";

/// Server builder for easier configuration
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<Config>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the HTTP server
    pub async fn build(self) -> Result<HttpServer> {
        let config = self
            .config
            .ok_or_else(|| GatewayError::config("Configuration is required"))?;

        HttpServer::new(&config).await
    }
}

/// Load the configuration file, falling back to environment-only config
/// when the default file is absent
pub async fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading configuration file: {}", path);
            Config::from_file(path).await
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            info!("Loading configuration file: {}", DEFAULT_CONFIG_PATH);
            Config::from_file(DEFAULT_CONFIG_PATH).await
        }
        None => {
            warn!(
                "No configuration file at {}, using defaults and METER_* variables",
                DEFAULT_CONFIG_PATH
            );
            Config::from_env()
        }
    }
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> Result<()> {
    info!("Starting llm-meter gateway");

    let server = ServerBuilder::new().with_config(config.clone()).build().await?;
    info!(
        "Server starting at: http://{}:{}",
        config.server().host,
        config.server().port
    );
    for provider in config.providers().iter().filter(|p| p.enabled) {
        info!("   ANY  /{}/... -> {}", provider.name, provider.base_url);
    }
    info!("   POST /v1/feedback");
    info!("   GET  /v1/pricing/cost, /v1/pricing/sql");
    info!("   GET  /health");

    server.start().await
}
