use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tenant_core::TenantStatus;
use tracing::warn;
use uuid::Uuid;

use crate::cache::KeyCache;
use crate::error::{CredentialError, CredentialResult};
use crate::model::{mask_key, ApiKey, ApiKeySummary, NewApiKey};

/// Credential store: validates, mints, revokes and lists
/// API keys. Uses the same in-process `key_cache` + periodic refresh
/// idiom seen elsewhere in this codebase, generalized into a
/// TTL-bounded per-key cache with synchronous local revoke invalidation.
#[derive(Clone)]
pub struct CredentialStore {
    pool: PgPool,
    cache: KeyCache,
}

impl CredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: KeyCache::new(),
        }
    }

    pub fn hash_key(plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn generate_plaintext() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("sk_live_{}", hex::encode(bytes))
    }

    /// `validate(key)` — cache hit skips the database round-trip; a miss
    /// reads through to Postgres and repopulates the cache on success.
    pub async fn validate(&self, plaintext: &str) -> CredentialResult<ApiKey> {
        let key_hash = Self::hash_key(plaintext);
        let now = Utc::now();

        if let Some(key) = self.cache.get(&key_hash).await {
            return self.check_liveness(key, now);
        }

        let row = sqlx::query(
            "SELECT ak.id, ak.tenant_id, ak.tier_override, ak.name, ak.scopes, ak.active,
                    ak.expires_at, ak.last_used_at, ak.created_at, ak.metadata, t.status AS tenant_status
             FROM api_keys ak
             JOIN tenants t ON t.id = ak.tenant_id
             WHERE ak.key_hash = $1",
        )
        .bind(&key_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(CredentialError::NotFound);
        };

        let tenant_status_raw: String = row.get("tenant_status");
        let tenant_status = TenantStatus::parse(&tenant_status_raw).unwrap_or(TenantStatus::Active);

        let key = ApiKey {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            tier_override: row.get("tier_override"),
            name: row.get("name"),
            scopes: row.get("scopes"),
            active: row.get("active"),
            expires_at: row.get("expires_at"),
            last_used_at: row.get("last_used_at"),
            created_at: row.get("created_at"),
            metadata: row.get("metadata"),
        };

        if matches!(tenant_status, TenantStatus::Suspended | TenantStatus::Deleted) {
            return Err(CredentialError::TenantNotAdmittable);
        }

        let checked = self.check_liveness(key, now)?;
        self.cache.insert(key_hash.clone(), checked.clone()).await;

        let pool = self.pool.clone();
        let key_id = checked.id;
        tokio::spawn(async move {
            if let Err(err) = sqlx::query("UPDATE api_keys SET last_used_at = now() WHERE id = $1")
                .bind(key_id)
                .execute(&pool)
                .await
            {
                warn!(?err, %key_id, "failed to record last-used timestamp");
            }
        });

        Ok(checked)
    }

    fn check_liveness(&self, key: ApiKey, now: DateTime<Utc>) -> CredentialResult<ApiKey> {
        if !key.active {
            return Err(CredentialError::Inactive);
        }
        if key.is_expired(now) {
            return Err(CredentialError::Expired);
        }
        Ok(key)
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        tier_override: Option<String>,
        name: String,
        scopes: Vec<String>,
        expires_in: Option<chrono::Duration>,
        metadata: serde_json::Value,
    ) -> CredentialResult<NewApiKey> {
        let plaintext = Self::generate_plaintext();
        let key_hash = Self::hash_key(&plaintext);
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = expires_in.map(|d| now + d);

        sqlx::query(
            "INSERT INTO api_keys (id, tenant_id, key_hash, tier_override, name, scopes, active, expires_at, created_at, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, true, $7, $8, $9)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&key_hash)
        .bind(&tier_override)
        .bind(&name)
        .bind(&scopes)
        .bind(expires_at)
        .bind(now)
        .bind(&metadata)
        .execute(&self.pool)
        .await?;

        let key = ApiKey {
            id,
            tenant_id,
            tier_override,
            name,
            scopes,
            active: true,
            expires_at,
            last_used_at: None,
            created_at: now,
            metadata,
        };

        Ok(NewApiKey { key, plaintext })
    }

    pub async fn revoke(&self, id: Uuid) -> CredentialResult<()> {
        let row = sqlx::query("SELECT key_hash FROM api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Err(CredentialError::NotFound);
        };
        let key_hash: String = row.get("key_hash");

        sqlx::query("UPDATE api_keys SET active = false WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Synchronous local-node invalidation; peers rely on cache TTL.
        self.cache.invalidate(&key_hash).await;
        Ok(())
    }

    pub async fn list(&self, tenant_id: Uuid) -> CredentialResult<Vec<ApiKeySummary>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, name, key_hash, tier_override, scopes, active, expires_at, last_used_at, created_at
             FROM api_keys WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let key_hash: String = row.get("key_hash");
                ApiKeySummary {
                    id: row.get("id"),
                    tenant_id: row.get("tenant_id"),
                    name: row.get("name"),
                    masked_key: mask_key(&key_hash),
                    tier_override: row.get("tier_override"),
                    scopes: row.get("scopes"),
                    active: row.get("active"),
                    expires_at: row.get("expires_at"),
                    last_used_at: row.get("last_used_at"),
                    created_at: row.get("created_at"),
                }
            })
            .collect())
    }
}
