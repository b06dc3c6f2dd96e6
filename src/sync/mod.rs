pub mod backoff;
pub mod engine;
pub mod rate_limit;
pub mod transform;

pub use engine::{SyncStats, Synchronizer};
pub use rate_limit::RateLimiter;
