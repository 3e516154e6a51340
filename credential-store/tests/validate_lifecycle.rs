use chrono::Duration;
use credential_store::CredentialStore;
use serde_json::json;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

async fn prepare_schema(pool: &PgPool) {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS tenants (
            id UUID PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS api_keys (
            id UUID PRIMARY KEY,
            tenant_id UUID NOT NULL REFERENCES tenants(id),
            key_hash TEXT NOT NULL UNIQUE,
            tier_override TEXT,
            name TEXT NOT NULL,
            scopes TEXT[] NOT NULL DEFAULT '{}',
            active BOOLEAN NOT NULL DEFAULT true,
            expires_at TIMESTAMPTZ,
            last_used_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            metadata JSONB NOT NULL DEFAULT '{}'
        );
        "#,
    )
    .await
    .unwrap();
}

#[tokio::test]
#[ignore]
async fn create_validate_then_revoke() {
    let dsn = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this ignored test");
    let pool = PgPool::connect(&dsn).await.unwrap();
    prepare_schema(&pool).await;

    let tenant_id = Uuid::new_v4();
    sqlx::query("INSERT INTO tenants (id, slug, status) VALUES ($1, $2, 'active')")
        .bind(tenant_id)
        .bind(format!("tenant-{tenant_id}"))
        .execute(&pool)
        .await
        .unwrap();

    let store = CredentialStore::new(pool.clone());
    let created = store
        .create(
            tenant_id,
            None,
            "integration key".into(),
            vec!["read:products".into()],
            Some(Duration::hours(1)),
            json!({}),
        )
        .await
        .unwrap();

    let validated = store.validate(&created.plaintext).await.unwrap();
    assert_eq!(validated.id, created.key.id);
    assert!(validated.has_scope("read:products"));

    store.revoke(created.key.id).await.unwrap();
    let after_revoke = store.validate(&created.plaintext).await;
    assert!(after_revoke.is_err());
}
