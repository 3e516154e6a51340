use quota::{QuotaEnforcer, Resource};
use redis::aio::ConnectionManager;
use tenant_core::{Plan, Tenant, TenantSettings, TenantStatus, UsageCounters};
use uuid::Uuid;

fn tenant_near_limit() -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        slug: "acme".into(),
        plan: Plan::Free,
        status: TenantStatus::Active,
        settings: TenantSettings::default(),
        usage: UsageCounters {
            products: 39,
            ..Default::default()
        },
        created_at: chrono::Utc::now(),
    }
}

/// Requires `REDIS_URL`. Not run by default: `cargo test --ignored`.
#[tokio::test]
#[ignore]
async fn warning_fires_once_per_day() {
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL not set");
    let client = redis::Client::open(redis_url).expect("open redis client");
    let conn = ConnectionManager::new(client).await.expect("connect redis");
    let enforcer = QuotaEnforcer::new(conn);

    let tenant = tenant_near_limit();
    let first = enforcer.check(&tenant, Resource::Products, 1).await;
    assert!(first.allowed);
    assert!(first.warning, "first crossing of 80% should warn");

    let second = enforcer.check(&tenant, Resource::Products, 1).await;
    assert!(second.allowed);
    assert!(!second.warning, "same-day repeat should be deduped");
}

/// Requires `REDIS_URL`.
#[tokio::test]
#[ignore]
async fn denies_once_limit_is_crossed() {
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL not set");
    let client = redis::Client::open(redis_url).expect("open redis client");
    let conn = ConnectionManager::new(client).await.expect("connect redis");
    let enforcer = QuotaEnforcer::new(conn);

    let mut tenant = tenant_near_limit();
    tenant.usage.products = 50;
    let decision = enforcer.check(&tenant, Resource::Products, 1).await;
    assert!(!decision.allowed);
}
