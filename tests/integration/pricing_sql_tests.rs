//! The compiled SQL aggregate must total what runtime pricing charges
//!
//! Rows are written to the `response_log` table of an in-memory SQLite
//! warehouse and the aggregate is evaluated there.

use crate::assert_ok;
use crate::common::{RecordFactory, TestDatabase};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use llm_meter::core::loggable::{Loggable, ResponseRecord};
use llm_meter::core::proxy::{FeatureFlags, OmitFlags, ProxyRequest, StreamInterceptor};
use llm_meter::services::pricing::{
    CostRegistry, CostRule, CostRuleFile, MatchOperator, Pricing, ProviderCostsEntry, SqlDialect,
    compile_aggregate_expression,
};
use llm_meter::storage::LogStore;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use std::collections::BTreeMap;
use std::sync::Arc;

async fn sql_total(db: &TestDatabase, registry: &CostRegistry) -> Option<f64> {
    let expr = assert_ok!(compile_aggregate_expression(
        registry,
        "response_log",
        SqlDialect::Sqlite
    ));
    let sql = format!("SELECT {} AS total FROM response_log", expr);
    let row = assert_ok!(
        db.db()
            .connection()
            .query_one(Statement::from_string(DbBackend::Sqlite, sql))
            .await
    )
    .expect("aggregate row");
    assert_ok!(row.try_get::<Option<f64>>("", "total"))
}

/// Insert rows and return the runtime total for them
async fn insert_rows(
    db: &TestDatabase,
    registry: &CostRegistry,
    rows: &[(&str, &str, i64, i64)],
) -> f64 {
    let mut expected = 0.0;
    for (provider, model, prompt, completion) in rows {
        let record = RecordFactory::priced("req", provider, model, *prompt, *completion);
        assert_ok!(db.db().upsert_response(&record).await);
        expected += registry
            .price(model, provider, *prompt as u64, *completion as u64, 1, 1)
            .unwrap_or(0.0);
    }
    expected
}

/// Relay a JSON completion for `provider` and finalize its response record
async fn proxied_response(
    registry: &CostRegistry,
    provider: &str,
    model: &str,
    prompt: i64,
    completion: i64,
) -> ResponseRecord {
    let reply = serde_json::json!({
        "model": model,
        "usage": {"prompt_tokens": prompt, "completion_tokens": completion},
    })
    .to_string();
    let request = ProxyRequest {
        id: format!("req-{}", provider),
        start_time: Utc::now(),
        provider: provider.to_string(),
        target_url: url::Url::parse("https://upstream.test/v1/chat/completions").unwrap(),
        method: reqwest::Method::POST,
        headers: reqwest::header::HeaderMap::new(),
        body: Bytes::from_static(b"{}"),
        is_stream: false,
        retry_options: None,
        flags: FeatureFlags::default(),
        omit: OmitFlags::default(),
        user_id: None,
        properties: BTreeMap::new(),
    };

    let chunks: Vec<llm_meter::Result<Bytes>> = vec![Ok(Bytes::from(reply))];
    let (interceptor, body) =
        StreamInterceptor::new(Some(Box::pin(futures::stream::iter(chunks))));
    let loggable = Loggable::new(Arc::new(request), 200, interceptor);
    let _: Vec<_> = body.unwrap().collect().await;

    let (_, response) = assert_ok!(loggable.finalize(registry).await);
    response
}

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "sql total {} differs from runtime total {}",
        actual,
        expected
    );
}

#[tokio::test]
async fn test_builtin_rules_match_runtime() {
    let db = TestDatabase::new().await;
    let registry = assert_ok!(CostRegistry::builtin());

    let expected = insert_rows(
        &db,
        &registry,
        &[
            ("openai", "gpt-4-0613", 100, 50),
            ("openai", "GPT-4o-mini-2024-07-18", 12_000, 800),
            ("openai", "gpt-4o-2024-05-13", 1_500, 300),
            ("openai", "gpt-3.5-turbo-0125", 2_000, 1_000),
            ("openai", "dall-e-3", 0, 0),
            ("openai", "text-embedding-3-small", 8_000, 0),
            ("openai", "unknown-model", 1_000, 1_000),
            ("anthropic", "claude-3-5-sonnet-20240620", 3_000, 700),
            ("anthropic", "claude-3-haiku-20240307", 40_000, 2_000),
        ],
    )
    .await;

    let total = sql_total(&db, &registry).await.expect("non-empty table");
    assert_close(total, expected);
}

#[tokio::test]
async fn test_like_wildcards_are_literal() {
    let db = TestDatabase::new().await;
    let registry = assert_ok!(CostRegistry::from_rule_file(CostRuleFile {
        providers: vec![ProviderCostsEntry {
            provider: "local".to_string(),
            pattern: None,
            costs: vec![
                CostRule::new(MatchOperator::Equals, "my_model", Pricing::tokens(0.001, 0.002)),
                CostRule::new(MatchOperator::Includes, "50%", Pricing::tokens(0.5, 0.5)),
            ],
        }],
        default_costs: vec![CostRule::new(
            MatchOperator::StartsWith,
            "flat",
            Pricing {
                per_call: Some(0.25),
                ..Pricing::tokens(0.0, 0.0)
            },
        )],
    }));

    let expected = insert_rows(
        &db,
        &registry,
        &[
            ("local", "my_model", 10, 10),
            // `_` must not match any character
            ("local", "myxmodel", 10, 10),
            // `%` must not match any run of characters
            ("local", "discount-50-off", 10, 10),
            ("local", "discount-50%-off", 1, 1),
            ("local", "flat-rate", 999, 999),
        ],
    )
    .await;

    assert_close(expected, 0.001 * 10.0 + 0.002 * 10.0 + 1.0 + 0.25);
    let total = sql_total(&db, &registry).await.expect("non-empty table");
    assert_close(total, expected);
}

#[tokio::test]
async fn test_empty_table_sums_to_null() {
    let db = TestDatabase::new().await;
    let registry = assert_ok!(CostRegistry::builtin());
    assert_eq!(sql_total(&db, &registry).await, None);
}

#[tokio::test]
async fn test_regex_matched_provider_totals_match_runtime() {
    let db = TestDatabase::new().await;
    let registry = assert_ok!(CostRegistry::builtin());

    let mut expected = 0.0;
    for (provider, model, prompt, completion) in [
        ("azure-eastus", "gpt-35-turbo", 1_000, 1_000),
        ("Azure-WestEurope", "gpt-4", 100, 50),
        ("openai", "gpt-4-0613", 100, 50),
    ] {
        let response = proxied_response(&registry, provider, model, prompt, completion).await;
        expected += response.cost.expect("priced call");
        assert_ok!(db.db().upsert_response(&response).await);
    }

    let row = assert_ok!(
        db.db()
            .connection()
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM response_log WHERE provider = 'azure'".to_string(),
            ))
            .await
    )
    .expect("count row");
    assert_eq!(assert_ok!(row.try_get::<i64>("", "n")), 2);
    assert_close(expected, 0.0035 + 0.006 + 0.006);
    let total = sql_total(&db, &registry).await.expect("non-empty table");
    assert_close(total, expected);
}
