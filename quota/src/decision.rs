/// Outcome of a single `QuotaEnforcer::check` call: `(allowed,
/// current, limit)` plus whether this call crossed the 80% warning
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub current: i64,
    pub limit: i64,
    pub warning: bool,
}

impl QuotaDecision {
    pub fn unbounded(current: i64) -> Self {
        Self {
            allowed: true,
            current,
            limit: -1,
            warning: false,
        }
    }
}
