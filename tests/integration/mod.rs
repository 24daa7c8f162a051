//! Integration tests

pub mod config_tests;
pub mod database_tests;
pub mod delivery_tests;
pub mod pricing_sql_tests;
