use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::plan::Plan;
use crate::usage::UsageCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Pending,
    Provisioning,
    Active,
    Suspended,
    Deleted,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Pending => "pending",
            TenantStatus::Provisioning => "provisioning",
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TenantStatus::Pending),
            "provisioning" => Some(TenantStatus::Provisioning),
            "active" => Some(TenantStatus::Active),
            "suspended" => Some(TenantStatus::Suspended),
            "deleted" => Some(TenantStatus::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    pub currency: String,
    pub timezone: String,
    pub language: String,
    #[serde(default)]
    pub enabled_features: BTreeSet<String>,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            enabled_features: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub plan: Plan,
    pub status: TenantStatus,
    pub settings: TenantSettings,
    pub usage: UsageCounters,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Gateway admission gate: suspended or deleted tenants fail
    /// admission at the gateway.
    pub fn is_admittable(&self) -> bool {
        !matches!(self.status, TenantStatus::Suspended | TenantStatus::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: TenantStatus) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            slug: "acme".into(),
            plan: Plan::Free,
            status,
            settings: TenantSettings::default(),
            usage: UsageCounters::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn suspended_is_not_admittable() {
        assert!(!sample(TenantStatus::Suspended).is_admittable());
    }

    #[test]
    fn deleted_is_not_admittable() {
        assert!(!sample(TenantStatus::Deleted).is_admittable());
    }

    #[test]
    fn active_is_admittable() {
        assert!(sample(TenantStatus::Active).is_admittable());
    }
}
