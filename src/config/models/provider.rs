//! Provider configuration

use super::*;
use serde::{Deserialize, Serialize};

/// An upstream provider reachable under `/{name}/...`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Provider name, also the first path segment of proxied calls
    pub name: String,
    /// Base URL the remaining path and query are appended to
    pub base_url: String,
    /// Whether provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            enabled: true,
        }
    }
}
