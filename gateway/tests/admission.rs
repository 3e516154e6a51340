use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::any;
use axum::Router;
use credential_store::CredentialStore;
use gateway::{admission_middleware, AppState, GatewayConfig, GatewayMetrics};
use rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tenant_core::TenantRepository;
use tower::ServiceExt;
use usage_recorder::{UsageRecorder, UsageRecorderConfig};
use uuid::Uuid;

async fn echo() -> &'static str {
    "downstream"
}

/// The full admission pipeline wired against real Postgres
/// and Redis, exercising credential validation, tier resolution, and the
/// rate-limit headers/denial path end to end.
///
/// Requires `DATABASE_URL` and `REDIS_URL`. Not run by default:
/// `cargo test --ignored`.
#[tokio::test]
#[ignore]
async fn valid_key_is_admitted_and_headers_are_set() {
    let (state, plaintext, _tenant_id) = build_state(600).await;
    let app = build_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/widgets")
                .header("X-API-Key", plaintext)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.contains_key("X-RateLimit-Limit"));
    assert!(headers.contains_key("X-RateLimit-Remaining"));
    assert!(headers.contains_key("X-RateLimit-Reset"));
}

#[tokio::test]
#[ignore]
async fn missing_credential_is_rejected() {
    let (state, _plaintext, _tenant_id) = build_state(600).await;
    let app = build_app(state);

    let response = app.oneshot(Request::builder().uri("/widgets").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn exceeding_the_tier_limit_yields_429_with_headers() {
    let (state, plaintext, _tenant_id) = build_state(1).await;
    let app = build_app(state);

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/widgets")
                .header("X-API-Key", plaintext.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(
            Request::builder()
                .uri("/widgets")
                .header("X-API-Key", plaintext)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("Retry-After"));
    assert!(second.headers().contains_key("X-RateLimit-Remaining"));
}

fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/*path", any(echo))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), admission_middleware))
        .with_state(state)
}

async fn build_state(plan_rate_per_minute: i64) -> (AppState, String, Uuid) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL not set");

    let pool = PgPoolOptions::new().max_connections(5).connect(&database_url).await.expect("connect postgres");

    sqlx::query("DROP TABLE IF EXISTS api_keys").execute(&pool).await.unwrap();
    sqlx::query("DROP TABLE IF EXISTS tenants").execute(&pool).await.unwrap();
    sqlx::query(
        "CREATE TABLE tenants (
            id UUID PRIMARY KEY, slug TEXT UNIQUE NOT NULL, plan TEXT NOT NULL, status TEXT NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD', timezone TEXT NOT NULL DEFAULT 'UTC',
            language TEXT NOT NULL DEFAULT 'en', enabled_features TEXT[] NOT NULL DEFAULT '{}',
            products BIGINT NOT NULL DEFAULT 0, orders_this_month BIGINT NOT NULL DEFAULT 0,
            users BIGINT NOT NULL DEFAULT 0, storage_bytes BIGINT NOT NULL DEFAULT 0,
            api_calls_today BIGINT NOT NULL DEFAULT 0, api_calls_month BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TABLE api_keys (
            id UUID PRIMARY KEY, tenant_id UUID NOT NULL, key_hash TEXT NOT NULL, tier_override TEXT,
            name TEXT NOT NULL, scopes TEXT[] NOT NULL DEFAULT '{}', active BOOLEAN NOT NULL DEFAULT true,
            expires_at TIMESTAMPTZ, last_used_at TIMESTAMPTZ, created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            metadata JSONB NOT NULL DEFAULT '{}'
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let tenant_id = Uuid::new_v4();
    sqlx::query("INSERT INTO tenants (id, slug, plan, status) VALUES ($1, $2, 'enterprise', 'active')")
        .bind(tenant_id)
        .bind(format!("tenant-{tenant_id}"))
        .execute(&pool)
        .await
        .unwrap();

    let credential_store = CredentialStore::new(pool.clone());
    let new_key = credential_store
        .create(tenant_id, None, "test key".to_string(), vec!["read:widgets".to_string()], None, json!({}))
        .await
        .expect("create api key");

    let redis_client = redis::Client::open(redis_url.as_str()).expect("redis client");
    let redis_manager = redis::aio::ConnectionManager::new(redis_client).await.expect("redis connection manager");

    let tenant_repo = TenantRepository::new(pool.clone());
    let rate_limiter: Arc<dyn rate_limiter::RateLimiterEngine> = Arc::new(InMemoryRateLimiter::new());
    let (usage_recorder, _join) = UsageRecorder::spawn(pool, redis_manager, UsageRecorderConfig::default());

    let mut endpoint_overrides = std::collections::HashMap::new();
    endpoint_overrides.insert(
        "/widgets".to_string(),
        RateLimitConfig::new(10_000, plan_rate_per_minute as u32, 1_000_000, 10_000_000, 10_000),
    );
    let config = GatewayConfig {
        database_url,
        redis_url,
        bind_host: "0.0.0.0".to_string(),
        bind_port: 8080,
        upstream_base_url: "http://127.0.0.1:9000".to_string(),
        endpoint_overrides,
    };

    let state = AppState {
        credential_store,
        tenant_repo,
        rate_limiter,
        usage_recorder,
        http_client: reqwest::Client::new(),
        config: Arc::new(config),
        metrics: Arc::new(GatewayMetrics::new().unwrap()),
    };

    (state, new_key.plaintext, tenant_id)
}
