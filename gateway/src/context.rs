use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common_http_errors::ApiError;
use tenant_core::Plan;
use uuid::Uuid;

/// Request-scoped identity injected by the admission middleware.
/// Downstream handlers pull this via
/// `GatewayCtxExtractor` rather than re-parsing headers.
#[derive(Debug, Clone)]
pub struct GatewayContext {
    pub tenant_id: Uuid,
    pub api_key_id: Uuid,
    pub tier: Plan,
    pub scopes: Vec<String>,
}

impl GatewayContext {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

pub struct GatewayCtxExtractor(pub GatewayContext);

#[async_trait]
impl<S> FromRequestParts<S> for GatewayCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GatewayContext>()
            .cloned()
            .map(GatewayCtxExtractor)
            .ok_or_else(|| ApiError::internal("gateway context missing; admission middleware did not run", None))
    }
}

/// 403 on scope mismatch. Reuses
/// `ApiError::ForbiddenMissingRole`'s wire shape — a capability token is
/// conceptually the same "you lack X" 403 the error envelope already
/// models for roles.
pub fn require_scope(ctx: &GatewayContext, scope: &'static str) -> Result<(), ApiError> {
    if ctx.has_scope(scope) {
        Ok(())
    } else {
        Err(ApiError::ForbiddenMissingRole {
            role: scope,
            trace_id: None,
        })
    }
}
