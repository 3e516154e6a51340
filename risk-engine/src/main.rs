use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use common_audit::AuditProducer;
use common_http_errors::http_error_metrics_layer;
use risk_engine::metrics::RiskEngineMetrics;
use risk_engine::{handlers, AppState, GeoResolver, NoopGeoResolver, RiskEngine, RiskEngineConfig, RiskStore, RiskWeights};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

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

    let config = RiskEngineConfig::from_env()?;

    let db_pool = PgPool::connect(&config.database_url).await.context("failed to connect to postgres")?;

    let store = RiskStore::new(db_pool);
    let geo: Arc<dyn GeoResolver> = Arc::new(NoopGeoResolver);
    let weights = RiskWeights::from_env();
    let engine = RiskEngine::new(store.clone(), geo, weights, config.high_risk_countries.clone());
    let audit = AuditProducer::noop("risk-engine");
    let metrics = Arc::new(RiskEngineMetrics::new());

    let state = AppState {
        engine,
        store,
        audit,
        metrics,
    };

    let allowed_origins = ["http://localhost:3000", "http://localhost:3001", "http://localhost:5173"];
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any);

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/assess", post(handlers::assess))
        .route("/review/:order_id", post(handlers::review))
        .route("/assessments", get(handlers::list_assessments))
        .route("/blacklist", get(handlers::list_blacklist).post(handlers::create_blacklist_entry))
        .route("/blacklist/:id", delete(handlers::delete_blacklist_entry))
        .route("/rules", get(handlers::list_rules).post(handlers::create_rule))
        .route("/rules/:id", put(handlers::update_rule).delete(handlers::delete_rule))
        .with_state(state)
        .layer(axum::middleware::from_fn(http_error_metrics_layer("risk-engine")))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port).parse()?;
    tracing::info!(%addr, "starting risk-engine");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
