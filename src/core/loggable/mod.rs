//! Log record assembly
//!
//! A [`Loggable`] is created per proxied call and finalized off the client
//! path once the stream outcome is known.

mod assembler;
pub mod deferred;
mod records;
pub mod status;
pub mod usage;

pub use assembler::Loggable;
pub use deferred::Deferred;
pub use records::{RequestRecord, ResponseRecord};
pub use status::{
    STATUS_CANCELLED, STATUS_ERROR, STATUS_TIMEOUT, coerce_status, map_status, normalize_status,
};
pub use usage::{Usage, extract_usage};
