//! Common test utilities
//!
//! - In-memory SQLite warehouse with migrations applied
//! - Record factories with sensible defaults

pub mod database;
pub mod fixtures;

pub use database::TestDatabase;
pub use fixtures::RecordFactory;

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}
