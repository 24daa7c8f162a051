//! Cost rule types

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a rule's model value is compared against a model string
///
/// Every operator compares case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOperator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "includes")]
    Includes,
}

/// Model half of a cost rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMatcher {
    pub operator: MatchOperator,
    pub value: String,
}

impl ModelMatcher {
    pub fn new(operator: MatchOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }

    /// `model` must already be lowercase
    pub(super) fn matches_lowercase(&self, model: &str) -> bool {
        let value = self.value.to_lowercase();
        match self.operator {
            MatchOperator::Equals => model == value,
            MatchOperator::StartsWith => model.starts_with(&value),
            MatchOperator::Includes => model.contains(&value),
        }
    }

    pub fn matches(&self, model: &str) -> bool {
        self.matches_lowercase(&model.to_lowercase())
    }
}

/// Unit prices in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pricing {
    pub prompt_token: f64,
    pub completion_token: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_image: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_call: Option<f64>,
}

impl Pricing {
    pub const fn tokens(prompt_token: f64, completion_token: f64) -> Self {
        Self {
            prompt_token,
            completion_token,
            per_image: None,
            per_call: None,
        }
    }

    /// Total cost of the given usage; missing unit prices count as zero
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64, images: u64, calls: u64) -> f64 {
        prompt_tokens as f64 * self.prompt_token
            + completion_tokens as f64 * self.completion_token
            + images as f64 * self.per_image.unwrap_or(0.0)
            + calls as f64 * self.per_call.unwrap_or(0.0)
    }
}

/// One ordered entry of a rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRule {
    pub model: ModelMatcher,
    pub cost: Pricing,
}

impl CostRule {
    pub fn new(operator: MatchOperator, value: impl Into<String>, cost: Pricing) -> Self {
        Self {
            model: ModelMatcher::new(operator, value),
            cost,
        }
    }
}

/// Selects a provider table by name, optionally also by regex
#[derive(Debug, Clone)]
pub enum ProviderPattern {
    /// Exact provider name
    Name(String),
    /// Exact name, or any provider string the regex matches
    NameOrRegex { name: String, regex: Regex },
}

impl ProviderPattern {
    pub fn name(&self) -> &str {
        match self {
            ProviderPattern::Name(name) | ProviderPattern::NameOrRegex { name, .. } => name,
        }
    }

    pub fn matches_regex(&self, provider: &str) -> bool {
        match self {
            ProviderPattern::Name(_) => false,
            ProviderPattern::NameOrRegex { regex, .. } => regex.is_match(provider),
        }
    }
}

/// Ordered rule table of one provider
#[derive(Debug, Clone)]
pub struct ProviderCosts {
    pub pattern: ProviderPattern,
    pub costs: Vec<CostRule>,
}

/// On-disk shape of a rule file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRuleFile {
    pub providers: Vec<ProviderCostsEntry>,
    #[serde(default)]
    pub default_costs: Vec<CostRule>,
}

/// On-disk shape of one provider table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCostsEntry {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub costs: Vec<CostRule>,
}

/// Query for the cost endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostQuery {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default = "default_units")]
    pub images: u64,
    #[serde(default = "default_units")]
    pub per_call: u64,
}

fn default_units() -> u64 {
    1
}

/// Result of pricing one usage tuple
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostResult {
    pub provider: String,
    pub model: String,
    /// `None` when no rule priced the model
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
}
