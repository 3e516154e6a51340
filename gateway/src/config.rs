use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use rate_limiter::RateLimitConfig;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub database_url: String,
    pub redis_url: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Base URL downstream handlers are reverse-proxied to once a request
    /// clears admission. The handlers themselves are out of scope here.
    pub upstream_base_url: String,
    pub endpoint_overrides: HashMap<String, RateLimitConfig>,
}

#[derive(Debug, Deserialize)]
struct EndpointOverrideEntry {
    endpoint: String,
    per_minute: u32,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let redis_url = env::var("REDIS_URL").context("REDIS_URL must be set")?;
        let bind_host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let bind_port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let upstream_base_url =
            env::var("GATEWAY_UPSTREAM_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:9000".to_string());

        let endpoint_overrides = match env::var("GATEWAY_ENDPOINT_OVERRIDES") {
            Ok(raw) => parse_overrides(&raw)?,
            Err(_) => default_overrides(),
        };

        Ok(Self {
            database_url,
            redis_url,
            bind_host,
            bind_port,
            upstream_base_url,
            endpoint_overrides,
        })
    }
}

/// The only override shipped by default is a canonical example —
/// every other endpoint falls back to the tenant's tier default.
fn default_overrides() -> HashMap<String, RateLimitConfig> {
    let mut overrides = HashMap::new();
    overrides.insert("/api/v1/products".to_string(), derive_rate_limit_config(120));
    overrides
}

fn parse_overrides(raw: &str) -> Result<HashMap<String, RateLimitConfig>> {
    let entries: Vec<EndpointOverrideEntry> =
        serde_json::from_str(raw).context("GATEWAY_ENDPOINT_OVERRIDES must be a JSON array of {endpoint, per_minute}")?;
    Ok(entries
        .into_iter()
        .map(|e| (e.endpoint, derive_rate_limit_config(e.per_minute)))
        .collect())
}

/// Derives the full (second/minute/hour/day/burst) tuple from a single
/// per-minute figure — the dimension the tier table actually specifies;
/// the other dimensions are a fixed ratio of it, the same way a handful
/// of gateway constants are derived from a single `GATEWAY_RATE_LIMIT_RPM`
/// env var elsewhere in this codebase.
pub fn derive_rate_limit_config(per_minute: u32) -> RateLimitConfig {
    let per_second = (per_minute / 60).max(1);
    let per_hour = per_minute.saturating_mul(60);
    let per_day = per_hour.saturating_mul(24);
    let burst = (per_minute / 4).max(1);
    RateLimitConfig::new(per_second, per_minute, per_hour, per_day, burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_sane_ratios_from_per_minute() {
        let cfg = derive_rate_limit_config(120);
        assert_eq!(cfg.per_minute, 120);
        assert_eq!(cfg.per_second, 2);
        assert_eq!(cfg.per_hour, 7_200);
        assert_eq!(cfg.per_day, 172_800);
        assert_eq!(cfg.burst, 30);
    }

    #[test]
    fn parses_override_json() {
        let raw = r#"[{"endpoint": "/api/v1/products", "per_minute": 120}]"#;
        let overrides = parse_overrides(raw).unwrap();
        assert_eq!(overrides.get("/api/v1/products").unwrap().per_minute, 120);
    }
}
