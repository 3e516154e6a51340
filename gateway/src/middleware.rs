use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common_http_errors::ApiError;
use rate_limiter::normalize_endpoint;
use tenant_core::Plan;
use tracing::warn;

use crate::context::GatewayContext;
use crate::state::AppState;

/// The admission pipeline: extract credential →
/// validate → normalize endpoint → rate-limit check →
/// inject context → run downstream → enqueue usage metric,
/// never blocking on it.
pub async fn admission_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_bytes = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    // Step 1: extract API key from `X-API-Key` or `Bearer <token>`.
    let plaintext = extract_api_key(&request).ok_or_else(|| {
        state.metrics.record_denial("extract_credential");
        ApiError::unauthorized("missing_credential", None)
    })?;

    // Step 2: validate via the credential store.
    let api_key = state.credential_store.validate(&plaintext).await.map_err(|err| {
        state.metrics.record_denial("validate_credential");
        warn!(?err, "credential validation failed");
        ApiError::unauthorized("invalid_credential", None)
    })?;
    state.metrics.record_pass("validate_credential");

    let tier = resolve_tier(&state, &api_key).await;

    // Step 3: normalize the endpoint.
    let normalized = normalize_endpoint(&path);

    // Step 4: consult the rate limiter; headers are always set.
    let tier_default = crate::config::derive_rate_limit_config(tier.rate_limit_per_minute());
    let limit_config = rate_limiter::RateLimitConfig::compose(
        tier_default,
        state.config.endpoint_overrides.get(&normalized).copied(),
    );

    let rl_start = Instant::now();
    let decision = state
        .rate_limiter
        .check(&api_key.tenant_id.to_string(), &normalized, limit_config)
        .await
        .map_err(|err| {
            warn!(?err, "rate limiter backend failure");
            ApiError::internal(err, None)
        })?;
    state.metrics.observe_rate_limiter_latency(rl_start.elapsed().as_secs_f64());

    if !decision.allowed {
        state.metrics.record_denial("rate_limit");
        // Headers are always set, denial or not.
        let mut response = rate_limit_response_error(&decision).into_response();
        insert_rate_limit_headers(&mut response, &decision);
        return Ok(response);
    }
    state.metrics.record_pass("rate_limit");

    // Step 5: inject tenant id, api-key id, and tier into request context.
    let ctx = GatewayContext {
        tenant_id: api_key.tenant_id,
        api_key_id: api_key.id,
        tier,
        scopes: api_key.scopes.clone(),
    };
    request.extensions_mut().insert(ctx);
    let client_ip = client_ip_from_headers(request.headers());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Step 6: invoke the downstream handler.
    let response = next.run(request).await;
    let (parts, body) = response.into_parts();
    let status = parts.status;
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let response_bytes = body_bytes.len() as u64;
    let mut response = Response::from_parts(parts, Body::from(body_bytes));

    insert_rate_limit_headers(&mut response, &decision);

    // Step 7: enqueue the usage metric without blocking.
    let metric = usage_recorder::UsageMetric {
        tenant_id: api_key.tenant_id,
        api_key_id: api_key.id,
        endpoint: normalized,
        method,
        status_code: status.as_u16(),
        request_bytes,
        response_bytes,
        latency_ms: 0,
        timestamp: Utc::now(),
        client_ip,
        user_agent,
    };
    state.usage_recorder.record(metric);

    Ok(response)
}

fn extract_api_key(request: &Request<Body>) -> Option<String> {
    let headers = request.headers();
    if let Some(key) = headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

async fn resolve_tier(state: &AppState, api_key: &credential_store::ApiKey) -> Plan {
    if let Some(raw) = &api_key.tier_override {
        if let Some(plan) = Plan::parse(raw) {
            return plan;
        }
    }
    match state.tenant_repo.find_by_id(api_key.tenant_id).await {
        Ok(tenant) => tenant.plan,
        Err(err) => {
            warn!(?err, tenant_id = %api_key.tenant_id, "failed to resolve tenant plan, defaulting to free tier");
            Plan::Free
        }
    }
}

fn rate_limit_response_error(decision: &rate_limiter::RateDecision) -> ApiError {
    ApiError::rate_limited(None, decision.retry_after.unwrap_or(1))
}

fn insert_rate_limit_headers(response: &mut Response, decision: &rate_limiter::RateDecision) {
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&decision.reset.to_string()) {
        headers.insert("X-RateLimit-Reset", v);
    }
}

fn client_ip_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn extracts_from_x_api_key_header() {
        let req = Request::builder()
            .header("X-API-Key", "sk_live_abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_api_key(&req), Some("sk_live_abc".to_string()));
    }

    #[test]
    fn extracts_from_bearer_header() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer sk_live_xyz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_api_key(&req), Some("sk_live_xyz".to_string()));
    }

    #[test]
    fn missing_credential_extracts_none() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_api_key(&req), None);
    }
}
