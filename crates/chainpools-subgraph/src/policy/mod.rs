//! Request pacing for the subgraph gateway.
//!
//! ```text
//! Request → [RateLimiter] → [RetryPolicy] → HTTP
//! ```

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{RateLimiter, RateLimiterConfig, TokenBucket};
pub use retry::{RetryConfig, RetryPolicy};
