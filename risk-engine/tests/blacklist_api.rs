use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post};
use axum::Router;
use common_audit::AuditProducer;
use risk_engine::{handlers, AppState, NoopGeoResolver, RiskEngine, RiskStore, RiskWeights};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

/// Blacklist/rule CRUD is scoped server-side to the
/// `X-Tenant-ID` the gateway already resolved and trusts — never a
/// client-supplied tenant. Requires `DATABASE_URL`. Not run by default:
/// `cargo test --ignored`.
#[tokio::test]
#[ignore]
async fn blacklist_entries_are_scoped_to_the_trusted_tenant_header() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = PgPoolOptions::new().max_connections(5).connect(&database_url).await.expect("connect postgres");

    sqlx::query("DROP TABLE IF EXISTS fraud_blacklist").execute(&pool).await.unwrap();
    sqlx::query(
        "CREATE TABLE fraud_blacklist (
            id UUID PRIMARY KEY, tenant_id UUID NOT NULL, entry_type TEXT NOT NULL,
            value TEXT NOT NULL, reason TEXT, expires_at TIMESTAMPTZ
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = RiskStore::new(pool);
    let engine = RiskEngine::new(store.clone(), Arc::new(NoopGeoResolver), RiskWeights::default(), HashSet::new());
    let state = AppState {
        engine,
        store,
        audit: AuditProducer::noop("risk-engine"),
        metrics: Arc::new(risk_engine::metrics::RiskEngineMetrics::new()),
    };

    let app = Router::new()
        .route("/blacklist", get(handlers::list_blacklist).post(handlers::create_blacklist_entry))
        .route("/blacklist/:id", delete(handlers::delete_blacklist_entry))
        .with_state(state);

    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    let create = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/blacklist")
                .header("X-Tenant-ID", tenant_a.to_string())
                .header("Content-Type", "application/json")
                .body(Body::from(json!({"entry_type": "email", "value": "fraud@example.com", "reason": "chargeback"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);

    let list_b = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/blacklist")
                .header("X-Tenant-ID", tenant_b.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(list_b.into_body(), usize::MAX).await.unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert!(entries.is_empty(), "tenant B must not see tenant A's blacklist entries");

    let list_a = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/blacklist")
                .header("X-Tenant-ID", tenant_a.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(list_a.into_body(), usize::MAX).await.unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(entries.len(), 1);

    let missing_header = app
        .oneshot(Request::builder().uri("/blacklist").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing_header.status(), StatusCode::BAD_REQUEST);
}
