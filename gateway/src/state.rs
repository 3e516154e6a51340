use std::sync::Arc;

use credential_store::CredentialStore;
use rate_limiter::RateLimiterEngine;
use tenant_core::TenantRepository;

use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;

#[derive(Clone)]
pub struct AppState {
    pub credential_store: CredentialStore,
    pub tenant_repo: TenantRepository,
    pub rate_limiter: Arc<dyn RateLimiterEngine>,
    pub usage_recorder: usage_recorder::UsageRecorder,
    pub http_client: reqwest::Client,
    pub config: Arc<GatewayConfig>,
    pub metrics: Arc<GatewayMetrics>,
}
