//! Pricing endpoints
//!
//! Price a single usage tuple, compile the active rules into warehouse SQL,
//! and reload the rule file.

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::services::pricing::{CostQuery, SqlDialect};
use crate::utils::error::Result;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configure pricing endpoints
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1/pricing")
            .route("/cost", web::get().to(calculate_cost))
            .route("/sql", web::get().to(aggregate_sql))
            .route("/reload", web::post().to(reload_rules)),
    );
}

/// Query of the SQL endpoint
#[derive(Debug, Deserialize)]
pub struct SqlRequest {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default)]
    pub dialect: Option<String>,
}

fn default_table() -> String {
    "response_log".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SqlResponse {
    pub dialect: SqlDialect,
    pub sql: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub reloaded: bool,
    pub rules: usize,
}

/// GET /v1/pricing/cost
pub async fn calculate_cost(
    state: web::Data<AppState>,
    query: web::Query<CostQuery>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(state.pricing.cost(&query))))
}

/// GET /v1/pricing/sql
pub async fn aggregate_sql(
    state: web::Data<AppState>,
    query: web::Query<SqlRequest>,
) -> Result<HttpResponse> {
    let dialect = match &query.dialect {
        Some(name) => name.parse::<SqlDialect>()?,
        None => SqlDialect::default(),
    };
    let sql = state.pricing.aggregate_sql(&query.table, dialect)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(SqlResponse {
        dialect,
        sql,
    })))
}

/// POST /v1/pricing/reload
pub async fn reload_rules(state: web::Data<AppState>) -> Result<HttpResponse> {
    let reloaded = state.pricing.reload().await?;
    let rules = state.pricing.snapshot().rule_count();
    info!(reloaded, rules, "Pricing reload requested");
    Ok(HttpResponse::Ok().json(ApiResponse::success(ReloadResponse { reloaded, rules })))
}
