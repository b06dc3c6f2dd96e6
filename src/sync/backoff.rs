//! Exponential backoff with bounded jitter for throttled AniList requests.

use std::time::Duration;

/// Per-attempt wait policy. The defaults match the endpoint's observed
/// throttling behavior; the knobs are configurable through `SYNC_RETRY_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Base delay in seconds for attempt zero.
    pub base_secs: f64,
    /// Upper bound on any single delay, in seconds.
    pub cap_secs: f64,
    /// Jitter amplitude as a fraction of the exponential term.
    pub jitter_factor: f64,
    /// Attempts per fetch before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_secs: 30.0,
            cap_secs: 600.0,
            jitter_factor: 0.1,
            max_attempts: 500,
        }
    }
}

impl RetryPolicy {
    /// `min(2^attempt * base + jitter, cap)` where jitter is uniform in
    /// `[-f * 2^attempt * base, +f * 2^attempt * base]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let exp = 2f64.powi(attempt.min(i32::MAX as u32) as i32) * self.base_secs;
        let jitter = exp * self.jitter_factor * (2.0 * rand::rng().random::<f64>() - 1.0);
        let secs = (exp + jitter).min(self.cap_secs).max(0.0);

        Duration::from_secs_f64(secs)
    }
}
