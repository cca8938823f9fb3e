/// Classification for retry policy.
///
/// Used by the retry executor's default predicate to decide whether a failed
/// provider call is worth another attempt.
///
/// # Behavior Summary
///
/// | Class | Retried by executor? | Examples |
/// |-------|----------------------|----------|
/// | `Retryable` | Yes, until `max_retries` | 5xx, network failure, timeout |
/// | `RetryableIfAllowed` | Only when the policy opts in | remote HTTP 429 |
/// | `Never` | No, propagates immediately | bad API key, local quota, bad payload |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Transient failure. Another attempt may succeed.
    Retryable,

    /// The provider told us to slow down (HTTP 429).
    ///
    /// Retrying immediately usually burns quota, so the executor only retries
    /// these when `RetryPolicy::retry_rate_limited` is set.
    RetryableIfAllowed,

    /// Terminal for this call: authentication, configuration, local quota,
    /// or a payload we could not understand.
    Never,
}
