use migrator::AdvisoryLock;
use sqlx::postgres::PgPoolOptions;

/// The migrator is single-operator: concurrent runs against the same
/// database are prohibited, enforced by an advisory lock.
///
/// Requires `DATABASE_URL`. Not run by default: `cargo test --ignored`.
#[tokio::test]
#[ignore]
async fn second_acquire_fails_while_first_holds_the_lock() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("connect postgres");

    let first = AdvisoryLock::acquire(&pool).await.expect("first acquire should succeed");
    let second = AdvisoryLock::acquire(&pool).await;
    assert!(second.is_err(), "concurrent migrator run must be rejected");

    first.release().await;
    let third = AdvisoryLock::acquire(&pool).await;
    assert!(third.is_ok(), "lock should be acquirable again after release");
}
