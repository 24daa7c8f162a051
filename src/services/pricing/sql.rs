//! Compiles a cost registry into a warehouse aggregate expression
//!
//! Unit prices are scaled by [`COST_MULTIPLE`] and rounded so the database
//! sums integers; the total is divided by the multiple once, outside `sum`.

use super::registry::CostRegistry;
use super::types::{CostRule, MatchOperator};
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

/// Integer scale applied to every unit price
pub const COST_MULTIPLE: i64 = 1_000_000_000;

/// Target SQL flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    ClickHouse,
    Postgres,
    Sqlite,
}

impl FromStr for SqlDialect {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clickhouse" => Ok(SqlDialect::ClickHouse),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            "sqlite" => Ok(SqlDialect::Sqlite),
            other => Err(GatewayError::bad_request(format!(
                "Unknown SQL dialect: {}",
                other
            ))),
        }
    }
}

impl SqlDialect {
    /// Quote a string literal
    fn literal(&self, value: &str) -> String {
        match self {
            SqlDialect::ClickHouse => {
                let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
                format!("'{}'", escaped)
            }
            SqlDialect::Postgres | SqlDialect::Sqlite => {
                format!("'{}'", value.replace('\'', "''"))
            }
        }
    }

    /// Case-insensitive LIKE of `column` against an already escaped pattern
    fn ilike(&self, column: &str, pattern: &str) -> String {
        match self {
            SqlDialect::ClickHouse | SqlDialect::Postgres => {
                format!("{} ILIKE {}", column, self.literal(pattern))
            }
            // SQLite LIKE ignores ASCII case already
            SqlDialect::Sqlite => {
                format!("{} LIKE {} ESCAPE '\\'", column, self.literal(pattern))
            }
        }
    }
}

/// Escape LIKE wildcards with a backslash
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn scaled(price: f64) -> i64 {
    (price * COST_MULTIPLE as f64).round() as i64
}

fn validate_table_ref(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(GatewayError::bad_request(format!(
            "Invalid table reference: {}",
            table
        )))
    }
}

fn model_condition(rule: &CostRule, table: &str, dialect: SqlDialect) -> String {
    let column = format!("{}.model", table);
    let value = escape_like(&rule.model.value);
    let pattern = match rule.model.operator {
        MatchOperator::Equals => value,
        MatchOperator::StartsWith => format!("{}%", value),
        MatchOperator::Includes => format!("%{}%", value),
    };
    dialect.ilike(&column, &pattern)
}

fn cost_terms(rule: &CostRule, table: &str) -> String {
    let prompt = scaled(rule.cost.prompt_token);
    let completion = scaled(rule.cost.completion_token);
    let image = scaled(rule.cost.per_image.unwrap_or(0.0));
    let per_call = scaled(rule.cost.per_call.unwrap_or(0.0));

    let mut terms = Vec::with_capacity(4);
    if prompt != 0 {
        terms.push(format!("{} * {}.prompt_tokens", prompt, table));
    }
    if completion != 0 {
        terms.push(format!("{} * {}.completion_tokens", completion, table));
    }
    if image != 0 {
        terms.push(image.to_string());
    }
    if per_call != 0 {
        terms.push(per_call.to_string());
    }

    if terms.is_empty() {
        "0".to_string()
    } else {
        terms.join(" + ")
    }
}

fn case_for_rules<'a, I>(rules: I, table: &str, dialect: SqlDialect) -> String
where
    I: IntoIterator<Item = &'a CostRule>,
{
    let mut sql = String::from("CASE");
    let mut any = false;
    for rule in rules {
        any = true;
        let _ = write!(
            sql,
            " WHEN ({}) THEN {}",
            model_condition(rule, table, dialect),
            cost_terms(rule, table)
        );
    }
    if !any {
        return "0".to_string();
    }
    sql.push_str(" ELSE 0 END");
    sql
}

/// Aggregate expression over `table` equal to summing `price` per row
///
/// The table needs `provider`, `model`, `prompt_tokens` and
/// `completion_tokens` columns.
pub fn compile_aggregate_expression(
    registry: &CostRegistry,
    table: &str,
    dialect: SqlDialect,
) -> Result<String> {
    validate_table_ref(table)?;

    let fallback = case_for_rules(registry.global(), table, dialect);
    if registry.providers().is_empty() {
        return Ok(format!("sum({}) / {}.0", fallback, COST_MULTIPLE));
    }

    let mut sql = String::from("sum(CASE");
    for provider in registry.providers() {
        let rules = provider.costs.iter().chain(registry.global().iter());
        let _ = write!(
            sql,
            " WHEN ({}.provider = {}) THEN ({})",
            table,
            dialect.literal(provider.pattern.name()),
            case_for_rules(rules, table, dialect)
        );
    }
    let _ = write!(sql, " ELSE ({}) END) / {}.0", fallback, COST_MULTIPLE);
    Ok(sql)
}
