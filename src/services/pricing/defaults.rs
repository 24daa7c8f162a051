//! Built-in rule tables used when no rule file is configured

use super::types::{CostRule, CostRuleFile, MatchOperator::*, Pricing, ProviderCostsEntry};

fn openai_costs() -> Vec<CostRule> {
    vec![
        CostRule::new(StartsWith, "gpt-4o-mini", Pricing::tokens(0.000_000_15, 0.000_000_6)),
        CostRule::new(StartsWith, "gpt-4o", Pricing::tokens(0.000_005, 0.000_015)),
        CostRule::new(StartsWith, "gpt-4-turbo", Pricing::tokens(0.000_01, 0.000_03)),
        CostRule::new(StartsWith, "gpt-4-1106", Pricing::tokens(0.000_01, 0.000_03)),
        CostRule::new(StartsWith, "gpt-4-0125", Pricing::tokens(0.000_01, 0.000_03)),
        CostRule::new(StartsWith, "gpt-4-vision", Pricing::tokens(0.000_01, 0.000_03)),
        CostRule::new(StartsWith, "gpt-4-32k", Pricing::tokens(0.000_06, 0.000_12)),
        CostRule::new(StartsWith, "gpt-4", Pricing::tokens(0.000_03, 0.000_06)),
        CostRule::new(
            Equals,
            "gpt-3.5-turbo-instruct",
            Pricing::tokens(0.000_001_5, 0.000_002),
        ),
        CostRule::new(StartsWith, "gpt-3.5-turbo-16k", Pricing::tokens(0.000_003, 0.000_004)),
        CostRule::new(StartsWith, "gpt-3.5-turbo", Pricing::tokens(0.000_000_5, 0.000_001_5)),
        CostRule::new(Equals, "text-embedding-3-small", Pricing::tokens(0.000_000_02, 0.0)),
        CostRule::new(Equals, "text-embedding-3-large", Pricing::tokens(0.000_000_13, 0.0)),
        CostRule::new(Equals, "text-embedding-ada-002", Pricing::tokens(0.000_000_1, 0.0)),
        CostRule::new(Equals, "whisper-1", Pricing::tokens(0.0, 0.0)),
        CostRule::new(
            Equals,
            "dall-e-3",
            Pricing {
                per_image: Some(0.04),
                ..Pricing::tokens(0.0, 0.0)
            },
        ),
        CostRule::new(
            Equals,
            "dall-e-2",
            Pricing {
                per_image: Some(0.02),
                ..Pricing::tokens(0.0, 0.0)
            },
        ),
    ]
}

fn anthropic_costs() -> Vec<CostRule> {
    vec![
        CostRule::new(Includes, "claude-3-5-sonnet", Pricing::tokens(0.000_003, 0.000_015)),
        CostRule::new(Includes, "claude-3-opus", Pricing::tokens(0.000_015, 0.000_075)),
        CostRule::new(Includes, "claude-3-sonnet", Pricing::tokens(0.000_003, 0.000_015)),
        CostRule::new(Includes, "claude-3-haiku", Pricing::tokens(0.000_000_25, 0.000_001_25)),
        CostRule::new(Includes, "claude-instant", Pricing::tokens(0.000_000_8, 0.000_002_4)),
        CostRule::new(Includes, "claude-2", Pricing::tokens(0.000_008, 0.000_024)),
    ]
}

fn azure_costs() -> Vec<CostRule> {
    vec![
        CostRule::new(StartsWith, "gpt-35-turbo-16k", Pricing::tokens(0.000_003, 0.000_004)),
        CostRule::new(StartsWith, "gpt-35-turbo", Pricing::tokens(0.000_001_5, 0.000_002)),
        CostRule::new(StartsWith, "gpt-4-32k", Pricing::tokens(0.000_06, 0.000_12)),
        CostRule::new(StartsWith, "gpt-4", Pricing::tokens(0.000_03, 0.000_06)),
    ]
}

/// Rule file equivalent of the built-in tables
pub fn builtin_rule_file() -> CostRuleFile {
    let mut default_costs = openai_costs();
    default_costs.extend(anthropic_costs());

    CostRuleFile {
        providers: vec![
            ProviderCostsEntry {
                provider: "openai".to_string(),
                pattern: None,
                costs: openai_costs(),
            },
            ProviderCostsEntry {
                provider: "anthropic".to_string(),
                pattern: None,
                costs: anthropic_costs(),
            },
            ProviderCostsEntry {
                provider: "azure".to_string(),
                pattern: Some("(?i)^azure".to_string()),
                costs: azure_costs(),
            },
        ],
        default_costs,
    }
}
