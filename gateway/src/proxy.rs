use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use common_http_errors::ApiError;
use tracing::warn;

use crate::context::GatewayCtxExtractor;
use crate::state::AppState;

/// Reverse-proxies an admitted request to the downstream handler.
/// The downstream business services themselves
/// (order/product/payment/etc.) are explicitly out of scope — this is
/// the generic "invoke downstream handler" seam any of them plug into,
/// rather than a single hardcoded vertical.
pub async fn proxy_downstream(
    State(state): State<AppState>,
    GatewayCtxExtractor(ctx): GatewayCtxExtractor,
    req: Request<Body>,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|err| ApiError::internal(err, None))?;

    let mut url = format!("{}{}", state.config.upstream_base_url, parts.uri.path());
    if let Some(query) = parts.uri.query() {
        url.push('?');
        url.push_str(query);
    }

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET);
    let mut builder = state.http_client.request(method, &url).body(body_bytes);
    builder = builder
        .header("X-Tenant-ID", ctx.tenant_id.to_string())
        .header("X-Api-Key-ID", ctx.api_key_id.to_string())
        .header("X-Tier", ctx.tier.as_str());

    let upstream = builder.send().await.map_err(|err| {
        warn!(?err, url, "downstream handler unreachable");
        ApiError::internal(err, None)
    })?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let response_headers = convert_headers(upstream.headers());
    let bytes = upstream.bytes().await.map_err(|err| ApiError::internal(err, None))?;

    let mut response = Response::builder().status(status).body(Body::from(bytes)).map_err(|err| ApiError::internal(err, None))?;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn convert_headers(src: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut dst = HeaderMap::with_capacity(src.len());
    for (name, value) in src.iter() {
        if let (Ok(name), Ok(value)) = (
            axum::http::HeaderName::from_bytes(name.as_str().as_bytes()),
            axum::http::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            dst.append(name, value);
        }
    }
    dst
}
