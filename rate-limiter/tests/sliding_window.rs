use rate_limiter::{InMemoryRateLimiter, RateLimitConfig, RateLimiterEngine};

#[tokio::test]
async fn burst_then_recovery_within_configured_limit() {
    let limiter = InMemoryRateLimiter::new();
    let limit = RateLimitConfig::new(100, 3, 1_000, 10_000, 5);

    for _ in 0..3 {
        let decision = limiter
            .check("tenant-x", "/api/v1/orders", limit)
            .await
            .expect("backend available");
        assert!(decision.allowed);
        assert_eq!(decision.limit, 3);
    }

    let denied = limiter
        .check("tenant-x", "/api/v1/orders", limit)
        .await
        .expect("backend available");
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert!(denied.retry_after.unwrap() > 0);
}

#[tokio::test]
async fn normalized_endpoints_share_a_counter() {
    use rate_limiter::normalize_endpoint;

    let limiter = InMemoryRateLimiter::new();
    let limit = RateLimitConfig::new(100, 1, 1_000, 10_000, 5);

    let a = normalize_endpoint("/api/v1/orders/42");
    let b = normalize_endpoint("/api/v1/orders/550e8400-e29b-41d4-a716-446655440000");
    assert_eq!(a, b);

    assert!(limiter.check("tenant-y", &a, limit).await.unwrap().allowed);
    let second = limiter.check("tenant-y", &b, limit).await.unwrap();
    assert!(!second.allowed);
}
