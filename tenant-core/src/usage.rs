use serde::{Deserialize, Serialize};

/// Per-tenant resource counters consulted by the quota enforcer.
/// `api_calls_today`/`api_calls_month` are refreshed from the usage
/// recorder's live KV counters rather than stored authoritatively here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub products: i64,
    pub orders_this_month: i64,
    pub users: i64,
    pub storage_bytes: i64,
    pub api_calls_today: i64,
    pub api_calls_month: i64,
}
