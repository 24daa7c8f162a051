//! Status normalization for the warehouse

use crate::core::proxy::TerminalReason;

pub const STATUS_CANCELLED: i32 = -3;
pub const STATUS_TIMEOUT: i32 = -2;
pub const STATUS_ERROR: i32 = -100;

/// Upstream statuses outside `[200, 600)` become 500
pub fn coerce_status(status: u16) -> i32 {
    if (200..600).contains(&status) {
        i32::from(status)
    } else {
        500
    }
}

/// Stored status for a (coerced status, terminal reason) pair
pub fn map_status(status: i32, reason: Option<TerminalReason>) -> i32 {
    match reason {
        Some(TerminalReason::Cancel) => STATUS_CANCELLED,
        Some(TerminalReason::Timeout) => STATUS_TIMEOUT,
        Some(TerminalReason::Error) => STATUS_ERROR,
        Some(TerminalReason::Done) | None => status,
    }
}

/// Both steps in order
pub fn normalize_status(status: u16, reason: Option<TerminalReason>) -> i32 {
    map_status(coerce_status(status), reason)
}
