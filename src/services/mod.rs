//! Services module
//!
//! Pricing and delivery, both independent of the HTTP layer.

pub mod delivery;
pub mod pricing;

pub use delivery::LogDispatcher;
pub use pricing::{CostRegistry, PricingService};
