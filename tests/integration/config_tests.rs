//! Configuration files driving the services they configure

use crate::assert_ok;
use llm_meter::Config;
use llm_meter::server::load_config;
use llm_meter::services::pricing::{CostQuery, PricingService};
use std::io::Write;
use tempfile::NamedTempFile;

const EXAMPLE_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/gateway.yaml.example");

const RULES: &str = r#"{
  "providers": [
    {
      "provider": "local",
      "pattern": "^local-",
      "costs": [
        {"model": {"operator": "startsWith", "value": "llama"}, "cost": {"prompt_token": 0.000001, "completion_token": 0.000002}}
      ]
    }
  ],
  "default_costs": [
    {"model": {"operator": "includes", "value": "mistral"}, "cost": {"prompt_token": 0.000003, "completion_token": 0.000003, "per_call": 0.01}}
  ]
}"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_example_config_loads() {
    let config = assert_ok!(Config::from_file(EXAMPLE_CONFIG).await);

    assert_eq!(config.server().port, 8787);
    assert!(config.gateway.get_provider("openai").is_some());
    assert!(config.gateway.get_provider("anthropic").is_some());
    assert_eq!(config.queue().lanes.fallback, "request-response-kv-fallback");
    assert_eq!(config.queue().max_deliveries, 5);
    assert!(config.pricing().rules_path.is_none());
}

#[tokio::test]
async fn test_load_config_with_explicit_path() {
    let file = write_temp(
        r#"
server:
  port: 9100
providers:
  - name: local
    base_url: "http://127.0.0.1:11434"
"#,
    );

    let config = assert_ok!(load_config(file.path().to_str()).await);
    assert_eq!(config.server().port, 9100);
    assert_eq!(config.providers().len(), 1);
    assert_eq!(config.providers()[0].name, "local");
}

#[tokio::test]
async fn test_rules_file_from_config() {
    let rules = write_temp(RULES);
    let file = write_temp(&format!(
        r#"
providers:
  - name: local
    base_url: "http://127.0.0.1:11434"
pricing:
  rules_path: "{}"
"#,
        rules.path().display()
    ));

    let config = assert_ok!(Config::from_file(file.path()).await);
    let pricing = assert_ok!(PricingService::from_config(config.pricing()).await);
    assert_eq!(pricing.snapshot().rule_count(), 2);

    let query = |provider: &str, model: &str| CostQuery {
        provider: provider.to_string(),
        model: model.to_string(),
        prompt_tokens: 1_000,
        completion_tokens: 1_000,
        images: 1,
        per_call: 1,
    };

    // Provider regex selects the table
    let cost = pricing.cost(&query("local-gpu-2", "Llama-3-8b")).cost.unwrap();
    assert!((cost - 0.003).abs() < 1e-12);

    // Global rules apply under a provider table
    let cost = pricing.cost(&query("local", "mistral-7b")).cost.unwrap();
    assert!((cost - 0.016).abs() < 1e-12);

    // No provider table, no price
    assert!(pricing.cost(&query("openai", "mistral-7b")).cost.is_none());

    assert!(assert_ok!(pricing.reload().await));
}
