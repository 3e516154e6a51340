use async_trait::async_trait;

use crate::config::RateLimitConfig;
use crate::decision::{RateDecision, RateLimitError};

/// Sliding-window admission check over `(tenant, endpoint)`. Failure bubbles up as an error — the component fails closed by
/// default; callers may choose to fail open.
#[async_trait]
pub trait RateLimiterEngine: Send + Sync {
    async fn check(
        &self,
        tenant_id: &str,
        endpoint: &str,
        limit: RateLimitConfig,
    ) -> Result<RateDecision, RateLimitError>;
}
