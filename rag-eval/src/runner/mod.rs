//! Batch execution

pub mod batch;
pub mod rate_limiter;

pub use batch::{BatchError, BatchRunner, ConsoleProgress, NoOpProgress, ProgressCallback, RowOutcome};
pub use rate_limiter::RateLimiter;
