use serde::{Deserialize, Serialize};

/// Subscription tier. Drives both the rate limiter's tier defaults
/// and the quota enforcer's plan limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Plan::Free),
            "starter" => Some(Plan::Starter),
            "pro" | "professional" => Some(Plan::Pro),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }

    /// Hard plan limits consulted by the quota enforcer. A limit of
    /// -1 denotes unbounded.
    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                max_products: 50,
                max_orders_per_month: 200,
                max_users: 2,
                max_storage_bytes: 1 * GB,
                api_rate_limit_per_minute: 60,
            },
            Plan::Starter => PlanLimits {
                max_products: 500,
                max_orders_per_month: 2_000,
                max_users: 10,
                max_storage_bytes: 10 * GB,
                api_rate_limit_per_minute: 300,
            },
            Plan::Pro => PlanLimits {
                max_products: 10_000,
                max_orders_per_month: 50_000,
                max_users: 50,
                max_storage_bytes: 100 * GB,
                api_rate_limit_per_minute: 1_200,
            },
            Plan::Enterprise => PlanLimits {
                max_products: -1,
                max_orders_per_month: -1,
                max_users: -1,
                max_storage_bytes: -1,
                api_rate_limit_per_minute: 6_000,
            },
        }
    }

    /// Per-minute rate limit default for the rate limiter (4.B "tier_default").
    pub fn rate_limit_per_minute(&self) -> u32 {
        self.limits().api_rate_limit_per_minute.max(0) as u32
    }
}

const GB: i64 = 1024 * 1024 * 1024;

/// Resource limits for a plan. A value of -1 means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_products: i64,
    pub max_orders_per_month: i64,
    pub max_users: i64,
    pub max_storage_bytes: i64,
    pub api_rate_limit_per_minute: i64,
}

impl PlanLimits {
    /// API-month quota.E: `plan.APIRateLimit × 30 (approx.)`.
    pub fn api_requests_per_month(&self) -> i64 {
        if self.api_rate_limit_per_minute < 0 {
            -1
        } else {
            self.api_rate_limit_per_minute * 30
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enterprise_is_unbounded() {
        let limits = Plan::Enterprise.limits();
        assert_eq!(limits.max_products, -1);
        assert_eq!(limits.api_requests_per_month(), -1);
    }

    #[test]
    fn free_api_month_approximation() {
        let limits = Plan::Free.limits();
        assert_eq!(limits.api_requests_per_month(), 60 * 30);
    }

    #[test]
    fn parse_accepts_professional_alias() {
        assert_eq!(Plan::parse("professional"), Some(Plan::Pro));
    }
}
