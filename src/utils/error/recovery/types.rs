//! Retry options for the upstream forwarder

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff parameters
///
/// The total number of attempts is `max_retries + 1`. The wait before retry
/// `n` (zero based) is `min(min_timeout * factor^n, max_timeout)`, multiplied
/// by a random factor in `[1, 2)` when `randomize` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryOptions {
    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff multiplier
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Delay before the first retry
    #[serde(default = "default_min_timeout", with = "duration_millis")]
    pub min_timeout: Duration,
    /// Upper bound for any single delay
    #[serde(default = "default_max_timeout", with = "duration_millis")]
    pub max_timeout: Duration,
    /// Whether to randomize delays
    #[serde(default)]
    pub randomize: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            factor: default_factor(),
            min_timeout: default_min_timeout(),
            max_timeout: default_max_timeout(),
            randomize: false,
        }
    }
}

impl RetryOptions {
    /// Delay to wait before retry number `retry` (zero based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.min_timeout.as_millis() as f64 * self.factor.powi(retry as i32);
        let capped = base.min(self.max_timeout.as_millis() as f64);
        let millis = if self.randomize {
            (capped * (1.0 + rand::random::<f64>())).min(self.max_timeout.as_millis() as f64)
        } else {
            capped
        };
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

/// Ceilings applied to caller-supplied retry options
///
/// Callers choose their own backoff through request headers; the gateway
/// bounds the attempt count and keeps every delay within
/// `[min_timeout, max_timeout]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryLimits {
    /// Largest accepted `max_retries`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Shortest accepted delay
    #[serde(default = "default_floor_timeout", with = "duration_millis")]
    pub min_timeout: Duration,
    /// Longest accepted delay
    #[serde(default = "default_ceiling_timeout", with = "duration_millis")]
    pub max_timeout: Duration,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            min_timeout: default_floor_timeout(),
            max_timeout: default_ceiling_timeout(),
        }
    }
}

impl RetryOptions {
    /// Clamp these options into `limits`
    pub fn bounded(mut self, limits: &RetryLimits) -> Self {
        let ceiling = limits.max_timeout.max(limits.min_timeout);
        self.max_retries = self.max_retries.min(limits.max_retries);
        if !self.factor.is_finite() || self.factor < 1.0 {
            self.factor = 1.0;
        }
        self.min_timeout = self.min_timeout.clamp(limits.min_timeout, ceiling);
        self.max_timeout = self.max_timeout.clamp(self.min_timeout, ceiling);
        self
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_factor() -> f64 {
    2.0
}

fn default_min_timeout() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_timeout() -> Duration {
    Duration::from_millis(10_000)
}

fn default_floor_timeout() -> Duration {
    Duration::from_millis(100)
}

fn default_ceiling_timeout() -> Duration {
    Duration::from_millis(60_000)
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
