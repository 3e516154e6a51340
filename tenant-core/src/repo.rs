use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::plan::Plan;
use crate::tenant::{Tenant, TenantSettings, TenantStatus};
use crate::usage::UsageCounters;

#[derive(Debug, Error)]
pub enum TenantRepoError {
    #[error("tenant not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for the `tenants` table.
/// Every subsystem that needs a `Tenant` — the gateway's admission check,
/// the quota enforcer, the risk engine's blacklist scoping — goes through
/// this repository rather than querying `tenants` directly, the same
/// single-owner-per-table discipline applied throughout the codebase to
/// other repository structs.
#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Tenant, TenantRepoError> {
        let row = sqlx::query(
            "SELECT id, slug, plan, status, currency, timezone, language, enabled_features,
                    products, orders_this_month, users, storage_bytes, api_calls_today, api_calls_month,
                    created_at
             FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_tenant).transpose()?.ok_or(TenantRepoError::NotFound)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Tenant, TenantRepoError> {
        let row = sqlx::query(
            "SELECT id, slug, plan, status, currency, timezone, language, enabled_features,
                    products, orders_this_month, users, storage_bytes, api_calls_today, api_calls_month,
                    created_at
             FROM tenants WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_tenant).transpose()?.ok_or(TenantRepoError::NotFound)
    }

    /// Daily suspension job target: tenants whose most recent invoice has
    /// been unpaid for more than `days`.
    pub async fn list_past_due_over(&self, days: i64) -> Result<Vec<Uuid>, TenantRepoError> {
        let rows = sqlx::query(
            "SELECT t.id FROM tenants t
             JOIN subscription_invoices i ON i.tenant_id = t.id
             WHERE i.status = 'past_due' AND i.due_at < now() - ($1 || ' days')::interval
             AND t.status != 'suspended'",
        )
        .bind(days.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }

    /// Daily renewal job target: active tenants whose current billing
    /// period has ended.
    pub async fn list_due_for_renewal(&self) -> Result<Vec<Uuid>, TenantRepoError> {
        let rows = sqlx::query(
            "SELECT t.id FROM tenants t
             JOIN subscription_invoices i ON i.tenant_id = t.id
             WHERE i.period_end <= now() AND i.status = 'current' AND t.status = 'active'",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }

    pub async fn record_invoice_outcome(&self, tenant_id: Uuid, outcome: crate::billing::ChargeOutcome) -> Result<(), TenantRepoError> {
        let status = match outcome {
            crate::billing::ChargeOutcome::Paid => "current",
            crate::billing::ChargeOutcome::PastDue => "past_due",
        };
        sqlx::query(
            "INSERT INTO subscription_invoices (tenant_id, status, due_at, period_end)
             VALUES ($1, $2, now() + interval '30 days', now() + interval '30 days')",
        )
        .bind(tenant_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_suspended(&self, id: Uuid) -> Result<(), TenantRepoError> {
        sqlx::query("UPDATE tenants SET status = 'suspended' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Tenant deletion is a logical status transition, never a row
    /// purge: it cascades logically but does not purge historical
    /// metrics.
    pub async fn mark_deleted(&self, id: Uuid) -> Result<(), TenantRepoError> {
        sqlx::query("UPDATE tenants SET status = 'deleted' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_tenant(row: sqlx::postgres::PgRow) -> Result<Tenant, TenantRepoError> {
    let plan_raw: String = row.get("plan");
    let status_raw: String = row.get("status");
    let features: Vec<String> = row.get("enabled_features");

    Ok(Tenant {
        id: row.get("id"),
        slug: row.get("slug"),
        plan: Plan::parse(&plan_raw).unwrap_or(Plan::Free),
        status: TenantStatus::parse(&status_raw).unwrap_or(TenantStatus::Active),
        settings: TenantSettings {
            currency: row.get("currency"),
            timezone: row.get("timezone"),
            language: row.get("language"),
            enabled_features: features.into_iter().collect(),
        },
        usage: UsageCounters {
            products: row.get("products"),
            orders_this_month: row.get("orders_this_month"),
            users: row.get("users"),
            storage_bytes: row.get("storage_bytes"),
            api_calls_today: row.get("api_calls_today"),
            api_calls_month: row.get("api_calls_month"),
        },
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}
