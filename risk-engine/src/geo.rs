use async_trait::async_trait;

/// Resolved geo/network attributes for an IP.
#[derive(Debug, Clone, Default)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub is_proxy: bool,
    pub is_vpn: bool,
    pub is_tor: bool,
    pub is_hosting: bool,
}

/// IP geolocation lookup, pluggable like `RateLimiterEngine` so the
/// engine can swap in a real MaxMind/IP-intel backend without touching
/// the signal logic. Lookup failure degrades silently.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, ip: &str) -> Option<GeoInfo>;
}

/// Default resolver when no geo backend is configured: always reports
/// nothing, so the geo signal contributes zero factors rather than
/// failing the assessment.
pub struct NoopGeoResolver;

#[async_trait]
impl GeoResolver for NoopGeoResolver {
    async fn resolve(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }
}
