use thiserror::Error;

/// Outcome of a single admission check. `limit`,
/// `remaining` and `reset` are always populated so the gateway can set
/// the three response headers regardless of outcome; `retry_after` is
/// populated only on denial.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch-seconds window end.
    pub reset: i64,
    pub retry_after: Option<u64>,
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limiter backend unavailable: {0}")]
    Backend(String),
}
