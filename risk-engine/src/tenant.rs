use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common_http_errors::ApiError;
use uuid::Uuid;

/// Risk-engine sits behind the gateway, which has already validated the
/// caller's API key and forwards the resolved tenant as a trusted header.
/// There is no independent credential to re-verify here — only the
/// header to parse — so, unlike a JWT-claims-derived tenant guard,
/// scoping is a plain extractor rather than an `AuthContext` lookup.
pub struct TrustedTenant(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for TrustedTenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Tenant-ID")
            .ok_or_else(|| ApiError::bad_request("missing_tenant_header", None))?
            .to_str()
            .map_err(|_| ApiError::bad_request("invalid_tenant_header", None))?;
        let tenant_id = Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request("invalid_tenant_header", None))?;
        Ok(TrustedTenant(tenant_id))
    }
}
