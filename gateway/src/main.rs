use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use common_http_errors::http_error_metrics_layer;
use credential_store::CredentialStore;
use gateway::{admission_middleware, proxy_downstream, AppState, GatewayConfig, GatewayMetrics};
use rate_limiter::RedisRateLimiter;
use sqlx::PgPool;
use tenant_core::TenantRepository;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use usage_recorder::{UsageRecorder, UsageRecorderConfig};

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(resp) => resp,
        Err(err) => {
            warn!(?err, "failed to render metrics");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(axum::body::Body::from("metrics unavailable"))
                .expect("failed to build metrics error response")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = Arc::new(GatewayConfig::from_env()?);

    let db_pool = PgPool::connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    let redis_client = redis::Client::open(config.redis_url.as_str()).context("failed to create redis client")?;
    let redis_manager = redis::aio::ConnectionManager::new(redis_client)
        .await
        .context("failed to create redis connection manager")?;

    let credential_store = CredentialStore::new(db_pool.clone());
    let tenant_repo = TenantRepository::new(db_pool.clone());
    let rate_limiter = Arc::new(
        RedisRateLimiter::new(&config.redis_url, "gateway:rate")
            .await
            .context("failed to create rate limiter")?,
    );
    let (usage_recorder, _usage_join) =
        UsageRecorder::spawn(db_pool.clone(), redis_manager, UsageRecorderConfig::default());
    let http_client = reqwest::Client::builder()
        .build()
        .context("failed to build downstream HTTP client")?;
    let metrics = Arc::new(GatewayMetrics::new()?);

    let state = AppState {
        credential_store,
        tenant_repo,
        rate_limiter,
        usage_recorder,
        http_client,
        config: config.clone(),
        metrics: metrics.clone(),
    };

    let allowed_origins = ["http://localhost:3000", "http://localhost:3001", "http://localhost:5173"];
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(tower_http::cors::Any);

    let protected = Router::new()
        .route("/*path", any(proxy_downstream))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), admission_middleware));

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .merge(protected)
        .with_state(state)
        .layer(axum::middleware::from_fn(http_error_metrics_layer("gateway")))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port).parse()?;
    tracing::info!(%addr, "starting gateway");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
