use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::billing::{BillingProvider, ChargeOutcome};
use crate::repo::TenantRepository;

const RETRY_ATTEMPTS: u32 = 3;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Subscription renewal job: daily,
/// generate invoice, attempt charge, mark past-due on failure.
/// Uses the same `interval` + `MissedTickBehavior::Delay`
/// ticker idiom as other background loops in this codebase,
/// generalized to bounded-retry billing calls: retry with bounded
/// attempts, default 3, and log the final failure.
pub fn spawn_renewal_job(repo: TenantRepository, billing: Arc<dyn BillingProvider>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(DAY);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_renewal_pass(&repo, billing.as_ref()).await;
        }
    })
}

async fn run_renewal_pass(repo: &TenantRepository, billing: &dyn BillingProvider) {
    let due = match repo.list_due_for_renewal().await {
        Ok(tenants) => tenants,
        Err(err) => {
            warn!(?err, "failed to list tenants due for renewal");
            return;
        }
    };

    for tenant_id in due {
        let mut outcome = ChargeOutcome::PastDue;
        for attempt in 1..=RETRY_ATTEMPTS {
            outcome = billing.generate_invoice_and_charge(tenant_id).await;
            if outcome == ChargeOutcome::Paid {
                break;
            }
            warn!(%tenant_id, attempt, "renewal charge attempt failed");
        }
        if outcome == ChargeOutcome::PastDue {
            warn!(%tenant_id, "renewal charge failed after all retries, marking past-due");
        }
        if let Err(err) = repo.record_invoice_outcome(tenant_id, outcome).await {
            warn!(?err, %tenant_id, "failed to record renewal invoice outcome");
        }
    }
}

/// Subscription suspension job: daily,
/// "suspend tenants with invoices unpaid > 7 days."
pub fn spawn_suspension_job(repo: TenantRepository, unpaid_grace_days: i64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(DAY);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_suspension_pass(&repo, unpaid_grace_days).await;
        }
    })
}

async fn run_suspension_pass(repo: &TenantRepository, unpaid_grace_days: i64) {
    let overdue = match repo.list_past_due_over(unpaid_grace_days).await {
        Ok(tenants) => tenants,
        Err(err) => {
            warn!(?err, "failed to list past-due tenants");
            return;
        }
    };

    for tenant_id in &overdue {
        if let Err(err) = repo.mark_suspended(*tenant_id).await {
            warn!(?err, tenant_id = %tenant_id, "failed to suspend tenant");
        } else {
            info!(tenant_id = %tenant_id, "tenant suspended for non-payment");
        }
    }
}
