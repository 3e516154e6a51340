use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Write-once, append-only record of a single gateway request.
#[derive(Debug, Clone)]
pub struct UsageMetric {
    pub tenant_id: Uuid,
    pub api_key_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub request_bytes: u64,
    pub response_bytes: u64,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}
