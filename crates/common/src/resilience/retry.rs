//! Bounded retry execution with configurable backoff.
//!
//! The retry budget is explicit: a maximum attempt count and a backoff
//! schedule, both set up front by the caller. There is no open-ended
//! rescheduling; when the budget is spent the last error is returned.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors produced by the retry executor.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted
    #[error("all {attempts} retry attempts exhausted")]
    AttemptsExhausted { attempts: u32, last: E },

    /// The retry configuration is invalid
    #[error("invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Backoff strategy for calculating delays between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: `initial_delay * base^attempt`, capped at `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Delay before the given retry attempt (0-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let delay = initial_delay.as_millis() as f64 * base.powi(attempt as i32);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay schedule between attempts
    pub backoff: BackoffStrategy,
    /// Apply full jitter (uniform in `[0, delay]`) to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(500),
                base: 2.0,
                max_delay: Duration::from_secs(30),
            },
            jitter: true,
        }
    }
}

fn apply_jitter(delay: Duration, enabled: bool) -> Duration {
    if !enabled || delay.is_zero() {
        return delay;
    }
    let millis = delay.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
}

/// Run `operation` until it succeeds or the attempt budget is spent.
///
/// `operation` is re-invoked for every attempt; the future it returns is
/// awaited to completion each time. Delays are computed from the backoff
/// schedule and never applied after the final attempt.
pub async fn retry_with_config<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if config.max_attempts == 0 {
        return Err(RetryError::InvalidConfiguration {
            message: "max_attempts must be at least 1".into(),
        });
    }

    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation = operation_name, attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                attempt += 1;
                if attempt >= config.max_attempts {
                    warn!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %err,
                        "retry budget exhausted"
                    );
                    return Err(RetryError::AttemptsExhausted { attempts: attempt, last: err });
                }

                let delay = apply_jitter(config.backoff.calculate_delay(attempt - 1), config.jitter);
                debug!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
