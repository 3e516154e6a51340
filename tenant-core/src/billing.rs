use async_trait::async_trait;
use uuid::Uuid;

/// Outcome of a renewal attempt against the billing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    Paid,
    PastDue,
}

/// Billing is an out-of-scope downstream collaborator: the
/// renewal job only needs to invoke "generate invoice, attempt charge"
/// and react to the result, not implement a payment provider. Pluggable
/// the same way `GeoResolver`/`RateLimiterEngine` are, so a real billing
/// service adapter can be substituted without touching the job loop.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn generate_invoice_and_charge(&self, tenant_id: Uuid) -> ChargeOutcome;
}

/// Default used when no billing backend is wired up (local dev, tests):
/// always reports success so the renewal job has something to drive
/// without a real payment integration.
pub struct NoopBillingProvider;

#[async_trait]
impl BillingProvider for NoopBillingProvider {
    async fn generate_invoice_and_charge(&self, _tenant_id: Uuid) -> ChargeOutcome {
        ChargeOutcome::Paid
    }
}
