use std::sync::Arc;

use common_audit::AuditProducer;

use crate::engine::RiskEngine;
use crate::metrics::RiskEngineMetrics;
use crate::store::RiskStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: RiskEngine,
    pub store: RiskStore,
    pub audit: AuditProducer,
    pub metrics: Arc<RiskEngineMetrics>,
}
