//! Retry mechanism with exponential backoff

use super::types::RetryOptions;

/// Retry mechanism with exponential backoff
///
/// The caller decides which outcomes are transient. Once the attempt budget
/// is spent the last outcome is returned as is, whether it is a success value
/// the caller considered retryable or an error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    options: RetryOptions,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Maximum number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.options.max_retries.saturating_add(1)
    }

    /// Execute a function with retry logic
    pub async fn call<F, Fut, R, E, P>(&self, mut f: F, should_retry: P) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
        P: Fn(&Result<R, E>) -> bool,
    {
        let mut attempt = 0;

        loop {
            let outcome = f().await;
            attempt += 1;

            if attempt >= self.max_attempts() || !should_retry(&outcome) {
                return outcome;
            }

            tokio::time::sleep(self.options.delay_for(attempt - 1)).await;
        }
    }
}
