//! Provider orchestration: quota gating, fan-out and sample validation.

mod rate_limiter;
#[allow(clippy::module_inception)]
mod registry;
mod validator;

pub use rate_limiter::{
    Quota, RateLimitConfig, RateLimiter, DEFAULT_REQUESTS_PER_DAY, DEFAULT_REQUESTS_PER_MINUTE,
};
pub use registry::{ProviderOutcome, ProviderRegistry};
pub use validator::{SampleValidator, ValidationIssue, ValidationSeverity};
