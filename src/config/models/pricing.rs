//! Pricing configuration

use serde::{Deserialize, Serialize};

/// Where cost rules come from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PricingConfig {
    /// JSON rule file; the built-in tables are used when unset
    #[serde(default)]
    pub rules_path: Option<String>,
}
