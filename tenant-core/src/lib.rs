pub mod billing;
pub mod jobs;
pub mod plan;
pub mod repo;
pub mod tenant;
pub mod usage;

pub use billing::{BillingProvider, ChargeOutcome, NoopBillingProvider};
pub use jobs::{spawn_renewal_job, spawn_suspension_job};
pub use plan::{Plan, PlanLimits};
pub use repo::{TenantRepoError, TenantRepository};
pub use tenant::{Tenant, TenantSettings, TenantStatus};
pub use usage::UsageCounters;
