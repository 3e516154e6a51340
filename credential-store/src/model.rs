use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An API key. The plaintext key string is never stored — only its
/// SHA-256 hash,.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Tier override; when absent the tenant's plan applies.
    pub tier_override: Option<String>,
    pub name: String,
    pub scopes: Vec<String>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub metadata: Value,
}

impl ApiKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Result of `create()`: the stored key record plus the plaintext secret,
/// returned exactly once.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub key: ApiKey,
    pub plaintext: String,
}

/// Display-safe listing entry: key string masked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub masked_key: String,
    pub tier_override: Option<String>,
    pub scopes: Vec<String>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// First four and last four characters separated by a fixed token, or a
/// generic placeholder for strings shorter than eight characters.
pub fn mask_key(raw: &str) -> String {
    if raw.len() < 8 {
        "****".to_string()
    } else {
        format!("{}...{}", &raw[..4], &raw[raw.len() - 4..])
    }
}
