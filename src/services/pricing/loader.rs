//! Loading rule tables from JSON files

use super::defaults::builtin_rule_file;
use super::registry::CostRegistry;
use super::types::{CostRuleFile, ProviderCosts, ProviderPattern};
use crate::utils::error::{GatewayError, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;

impl CostRegistry {
    /// Registry backed by the built-in tables
    pub fn builtin() -> Result<Self> {
        Self::from_rule_file(builtin_rule_file())
    }

    /// Build a registry, compiling provider patterns
    pub fn from_rule_file(file: CostRuleFile) -> Result<Self> {
        let providers = file
            .providers
            .into_iter()
            .map(|entry| {
                let pattern = match entry.pattern {
                    Some(pattern) => ProviderPattern::NameOrRegex {
                        regex: Regex::new(&pattern).map_err(|e| {
                            GatewayError::parsing(format!(
                                "Invalid provider pattern for {}: {}",
                                entry.provider, e
                            ))
                        })?,
                        name: entry.provider,
                    },
                    None => ProviderPattern::Name(entry.provider),
                };
                Ok(ProviderCosts {
                    pattern,
                    costs: entry.costs,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(providers, file.default_costs))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: CostRuleFile = serde_json::from_str(content)
            .map_err(|e| GatewayError::parsing(format!("Failed to parse cost rules: {}", e)))?;
        Self::from_rule_file(file)
    }

    /// Load a registry from a JSON rule file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(GatewayError::Io)?;

        let registry = Self::from_json_str(&content)?;
        debug!(
            "Loaded {} cost rules from {:?}",
            registry.rule_count(),
            path.as_ref()
        );
        Ok(registry)
    }
}
