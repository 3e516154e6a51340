use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::config::RateLimitConfig;
use crate::decision::{RateDecision, RateLimitError};
use crate::engine::RateLimiterEngine;

const WINDOW_NANOS: i64 = 60_000_000_000;
const WINDOW_SECS: i64 = 60;
const KEY_TTL_SECS: i64 = 120;

/// Sliding window over the current minute implemented as a sorted set in
/// Redis: `ratelimit:<tenant>:<endpoint>:minute`, scores
/// and members are both the insertion's nanosecond timestamp. Builds on
/// a prior fixed-window `INCR` design, generalized to a true sliding
/// window with a pipelined, atomic transaction.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisRateLimiter {
    pub async fn new(redis_url: &str, prefix: impl Into<String>) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| RateLimitError::Backend(err.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| RateLimitError::Backend(err.to_string()))?;
        Ok(Self {
            manager,
            prefix: prefix.into(),
        })
    }

    fn key(&self, tenant_id: &str, endpoint: &str) -> String {
        format!("{}:{}:{}:minute", self.prefix, tenant_id, endpoint)
    }
}

#[async_trait]
impl RateLimiterEngine for RedisRateLimiter {
    async fn check(
        &self,
        tenant_id: &str,
        endpoint: &str,
        limit: RateLimitConfig,
    ) -> Result<RateDecision, RateLimitError> {
        let key = self.key(tenant_id, endpoint);
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        let window_start_ns = now_ns - WINDOW_NANOS;
        let now_secs = now_ns / 1_000_000_000;

        let mut conn = self.manager.clone();
        let (_added, _removed, cardinality, _expired, oldest): (
            i64,
            i64,
            i64,
            bool,
            Vec<(String, f64)>,
        ) = redis::pipe()
            .atomic()
            .zadd(&key, now_ns, now_ns)
            .zrembyscore(&key, "-inf", window_start_ns - 1)
            .zcard(&key)
            .expire(&key, KEY_TTL_SECS as usize)
            .zrange_withscores(&key, 0, 0)
            .query_async(&mut conn)
            .await
            .map_err(|err| RateLimitError::Backend(err.to_string()))?;

        let allowed = cardinality <= limit.per_minute as i64;
        let remaining = (limit.per_minute as i64 - cardinality).max(0) as u32;
        let reset = now_secs + WINDOW_SECS;

        let retry_after = if allowed {
            None
        } else {
            let oldest_ns = oldest
                .first()
                .map(|(_, score)| *score as i64)
                .unwrap_or(now_ns);
            let window_end_ns = oldest_ns + WINDOW_NANOS;
            let secs = ((window_end_ns - now_ns).max(1_000_000_000)) / 1_000_000_000;
            Some(secs.max(1) as u64)
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
