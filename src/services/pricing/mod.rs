//! Cost rule engine
//!
//! One canonical [`CostRegistry`] prices individual calls at runtime and
//! compiles into a SQL aggregate that reproduces the same totals in the
//! warehouse.

mod defaults;
mod loader;
mod registry;
mod service;
mod sql;
mod types;


pub use defaults::builtin_rule_file;
pub use registry::CostRegistry;
pub use service::PricingService;
pub use sql::{COST_MULTIPLE, SqlDialect, compile_aggregate_expression};
pub use types::{
    CostQuery, CostResult, CostRule, CostRuleFile, MatchOperator, ModelMatcher, Pricing,
    ProviderCosts, ProviderCostsEntry, ProviderPattern,
};
