//! # llm-meter
//!
//! A metering reverse proxy for LLM provider APIs.
//!
//! Calls to `/{provider}/...` are forwarded to the configured provider and the
//! response is streamed back to the caller byte for byte. Off the client path
//! the relayed body is captured, usage is extracted and priced, and a request
//! record plus a response record are pushed onto a durable queue. Lane workers
//! drain the queue into the warehouse tables with at-least-once semantics.
//!
//! ## Layout
//!
//! - [`core::proxy`]: forwarding, the stream tee and response shaping
//! - [`core::loggable`]: deferred assembly of log records
//! - [`services::pricing`]: cost rules, runtime pricing and SQL compilation
//! - [`services::delivery`]: queue producer and lane workers
//! - [`storage`]: database, Redis and in-memory backends
//! - [`server`]: the actix-web surface
//!
//! ## Running
//!
//! ```rust,no_run
//! use llm_meter::{Config, server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     server::run_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pricing in the warehouse
//!
//! ```rust
//! use llm_meter::services::pricing::{CostRegistry, SqlDialect, compile_aggregate_expression};
//!
//! let registry = CostRegistry::builtin().unwrap();
//! let sql = compile_aggregate_expression(&registry, "response_log", SqlDialect::ClickHouse).unwrap();
//! assert!(sql.starts_with("sum(CASE WHEN"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use utils::error::{GatewayError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
