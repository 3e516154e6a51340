use redis::aio::ConnectionManager;
use tenant_core::Tenant;
use tracing::warn;

use crate::decision::QuotaDecision;
use crate::resource::Resource;

const WARNING_DEDUP_TTL_SECS: i64 = 24 * 60 * 60;
const WARNING_THRESHOLD: f64 = 0.8;

/// Pre-mutation plan-limit check. Grounded on the rate
/// limiter's `RedisRateLimiter` for the dedup-key idiom (`SET NX EX`) and
/// on `tenant-core::Plan::limits` for the policy table itself.
#[derive(Clone)]
pub struct QuotaEnforcer {
    redis: ConnectionManager,
}

impl QuotaEnforcer {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// `check(tenant, resource, delta)`.E. Suspended or
    /// deleted tenants are denied regardless of resource. A plan limit of
    /// -1 is unbounded. Crossing the limit denies; crossing 80% of the
    /// limit while still allowed fires a one-shot daily warning.
    pub async fn check(&self, tenant: &Tenant, resource: Resource, delta: i64) -> QuotaDecision {
        let current = current_usage(tenant, resource);

        if !tenant.is_admittable() {
            return QuotaDecision {
                allowed: false,
                current,
                limit: resource.limit(&tenant.plan.limits()),
                warning: false,
            };
        }

        let limit = resource.limit(&tenant.plan.limits());
        if limit < 0 {
            return QuotaDecision::unbounded(current);
        }

        let projected = current + delta;
        let allowed = projected <= limit;
        let crosses_warning_threshold = (projected as f64) >= WARNING_THRESHOLD * (limit as f64);

        let warning = if allowed && crosses_warning_threshold {
            self.try_emit_warning(tenant.id.to_string().as_str(), resource)
                .await
        } else {
            false
        };

        QuotaDecision {
            allowed,
            current,
            limit,
            warning,
        }
    }

    /// Returns true only the first time in a given UTC day this
    /// (tenant, resource) pair crosses the warning threshold.
    async fn try_emit_warning(&self, tenant_id: &str, resource: Resource) -> bool {
        let day = chrono::Utc::now().format("%Y-%m-%d");
        let key = format!("quota_warning:{}:{}:{}", tenant_id, resource.as_str(), day);

        let mut conn = self.redis.clone();
        let result: Result<Option<String>, redis::RedisError> = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(WARNING_DEDUP_TTL_SECS)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(err) => {
                warn!(?err, tenant_id, resource = resource.as_str(), "failed to dedup quota warning");
                false
            }
        }
    }
}

fn current_usage(tenant: &Tenant, resource: Resource) -> i64 {
    match resource {
        Resource::Products => tenant.usage.products,
        Resource::OrdersPerMonth => tenant.usage.orders_this_month,
        Resource::TeamMembers => tenant.usage.users,
        Resource::StorageBytes => tenant.usage.storage_bytes,
        Resource::ApiRequestsPerMonth => tenant.usage.api_calls_month,
    }
}
