//! Bounded retry with a per-attempt deadline.
//!
//! Every network call path in the workspace goes through [`execute`]:
//! - each attempt runs under `tokio::time::timeout`; a timed-out attempt's
//!   future is dropped, which cancels the in-flight request
//! - a timeout counts as a failed attempt
//! - retries continue while `attempts <= max_retries` and the predicate allows it
//! - errors the predicate rejects propagate immediately
//!
//! Between attempts the executor sleeps with exponential backoff:
//! `initial_delay * 2^(retry - 1)`, capped at `max_delay`.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::errors::{RetryClass, WeatherDataError};

/// Default retry configuration
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 2_000;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry (doubles each retry)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Backoff {
    pub fn exponential(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
        }
    }

    /// Retry immediately. Used by tests and by callers that already pace themselves.
    pub fn none() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential(
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        )
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Deadline for each individual attempt
    pub timeout: Duration,
    /// Delay schedule between attempts
    pub backoff: Backoff,
    /// Whether remote HTTP 429 responses are retried
    pub retry_rate_limited: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            backoff: Backoff::default(),
            retry_rate_limited: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_retry_rate_limited(mut self, retry: bool) -> Self {
        self.retry_rate_limited = retry;
        self
    }

    /// Default predicate for provider calls, driven by [`RetryClass`].
    pub fn should_retry(&self, error: &AttemptError<WeatherDataError>) -> bool {
        match error {
            AttemptError::Timeout(_) => true,
            AttemptError::Operation(e) => match e.retry_class() {
                RetryClass::Retryable => true,
                RetryClass::RetryableIfAllowed => self.retry_rate_limited,
                RetryClass::Never => false,
            },
        }
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug, Clone)]
pub enum AttemptError<E> {
    /// The operation itself returned an error.
    Operation(E),
    /// The attempt exceeded its deadline and was cancelled.
    Timeout(Duration),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation(e) => write!(f, "{}", e),
            Self::Timeout(d) => write!(f, "attempt timed out after {:?}", d),
        }
    }
}

/// Final error once the executor gives up.
#[derive(Debug, Clone)]
pub struct ExecutionError<E> {
    /// The error from the last attempt
    pub last: AttemptError<E>,
    /// Number of attempts made
    pub attempts: u32,
    /// Wall time spent across all attempts
    pub elapsed: Duration,
}

impl<E> ExecutionError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self.last, AttemptError::Timeout(_))
    }
}

impl ExecutionError<WeatherDataError> {
    /// Flatten into a provider error, turning a final timeout into
    /// [`WeatherDataError::Timeout`] attributed to `provider`.
    pub fn into_weather_error(self, provider: &str) -> WeatherDataError {
        match self.last {
            AttemptError::Operation(e) => e,
            AttemptError::Timeout(timeout) => WeatherDataError::Timeout {
                provider: provider.to_string(),
                timeout,
            },
        }
    }
}

impl<E: fmt::Display> fmt::Display for ExecutionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (after {} attempt(s) in {:?})",
            self.last, self.attempts, self.elapsed
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ExecutionError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.last {
            AttemptError::Operation(e) => Some(e),
            AttemptError::Timeout(_) => None,
        }
    }
}

/// Run `operation` under `policy`.
///
/// `retry_predicate` decides whether a failed attempt is worth repeating.
/// Returns the first success, or an [`ExecutionError`] carrying the last
/// failure, the number of attempts and the elapsed time.
///
/// # Example
/// ```ignore
/// let sample = execute(&policy, |e| policy.should_retry(e), || async {
///     provider.fetch_current(coords).await
/// }).await?;
/// ```
pub async fn execute<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    retry_predicate: P,
    mut operation: F,
) -> Result<T, ExecutionError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&AttemptError<E>) -> bool,
    E: fmt::Display,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if attempts > 0 {
            let delay = policy.backoff.delay_for_retry(attempts);
            if !delay.is_zero() {
                debug!(
                    "Retry {} of {}, waiting {:?}",
                    attempts, policy.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        attempts += 1;

        let failure = match tokio::time::timeout(policy.timeout, operation()).await {
            Ok(Ok(value)) => {
                if attempts > 1 {
                    debug!("Operation succeeded after {} attempts", attempts);
                }
                return Ok(value);
            }
            Ok(Err(e)) => AttemptError::Operation(e),
            Err(_) => AttemptError::Timeout(policy.timeout),
        };

        let retryable = retry_predicate(&failure);
        if !retryable || attempts > policy.max_retries {
            if retryable {
                warn!(
                    "All {} attempts exhausted in {:?}: {}",
                    attempts,
                    started.elapsed(),
                    failure
                );
            } else {
                debug!("Non-retryable failure on attempt {}: {}", attempts, failure);
            }
            return Err(ExecutionError {
                last: failure,
                attempts,
                elapsed: started.elapsed(),
            });
        }

        debug!(
            "Retryable failure on attempt {} of {}: {}",
            attempts,
            policy.max_retries + 1,
            failure
        );
    }
}
