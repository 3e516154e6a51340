use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::config::RateLimitConfig;
use crate::decision::{RateDecision, RateLimitError};
use crate::engine::RateLimiterEngine;

const WINDOW: Duration = Duration::from_secs(60);

/// In-process sliding window, one `Vec<Instant-as-nanos>` per key. Used
/// by tests and local dev in place of `RedisRateLimiter`; never shared
/// across processes so it cannot back a real multi-instance gateway.
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, Vec<u128>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn key(tenant_id: &str, endpoint: &str) -> String {
        format!("{}:{}", tenant_id, endpoint)
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiterEngine for InMemoryRateLimiter {
    async fn check(
        &self,
        tenant_id: &str,
        endpoint: &str,
        limit: RateLimitConfig,
    ) -> Result<RateDecision, RateLimitError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| RateLimitError::Backend(err.to_string()))?;
        let now_ns = now.as_nanos();
        let window_start_ns = now_ns.saturating_sub(WINDOW.as_nanos());

        let key = Self::key(tenant_id, endpoint);
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| RateLimitError::Backend("in-memory rate limiter lock poisoned".into()))?;
        let entries = windows.entry(key).or_default();
        entries.retain(|ts| *ts >= window_start_ns);
        entries.push(now_ns);

        let cardinality = entries.len() as i64;
        let allowed = cardinality <= limit.per_minute as i64;
        let remaining = (limit.per_minute as i64 - cardinality).max(0) as u32;
        let reset = (now.as_secs() as i64) + WINDOW.as_secs() as i64;

        let retry_after = if allowed {
            None
        } else {
            let oldest_ns = entries.first().copied().unwrap_or(now_ns);
            let window_end_ns = oldest_ns + WINDOW.as_nanos();
            let secs = window_end_ns.saturating_sub(now_ns).max(1_000_000_000) / 1_000_000_000;
            Some((secs as u64).max(1))
        };

        Ok(RateDecision {
            allowed,
            limit: limit.per_minute,
            remaining,
            reset,
            retry_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_under_limit() {
        let limiter = InMemoryRateLimiter::new();
        let limit = RateLimitConfig::new(100, 5, 1_000, 10_000, 10);
        for _ in 0..5 {
            let decision = limiter.check("tenant-a", "/orders", limit).await.unwrap();
            assert!(decision.allowed);
        }
    }

    #[tokio::test]
    async fn denies_over_limit_and_sets_retry_after() {
        let limiter = InMemoryRateLimiter::new();
        let limit = RateLimitConfig::new(100, 2, 1_000, 10_000, 10);
        assert!(limiter.check("tenant-b", "/orders", limit).await.unwrap().allowed);
        assert!(limiter.check("tenant-b", "/orders", limit).await.unwrap().allowed);
        let third = limiter.check("tenant-b", "/orders", limit).await.unwrap();
        assert!(!third.allowed);
        assert!(third.retry_after.is_some());
    }

    #[tokio::test]
    async fn tenants_and_endpoints_are_independent() {
        let limiter = InMemoryRateLimiter::new();
        let limit = RateLimitConfig::new(100, 1, 1_000, 10_000, 10);
        assert!(limiter.check("tenant-c", "/orders", limit).await.unwrap().allowed);
        assert!(limiter.check("tenant-d", "/orders", limit).await.unwrap().allowed);
        assert!(limiter.check("tenant-c", "/products", limit).await.unwrap().allowed);
    }
}
