use std::collections::HashSet;
use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RiskEngineConfig {
    pub database_url: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Country codes treated as high-risk by the geo signal; empty by default since no stance on "risky
    /// country" is universal across deployments.
    pub high_risk_countries: HashSet<String>,
}

impl RiskEngineConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let bind_port = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()).unwrap_or(8081);
        let high_risk_countries = env::var("RISK_HIGH_RISK_COUNTRIES")
            .ok()
            .map(|raw| raw.split(',').map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()).collect())
            .unwrap_or_default();

        Ok(Self {
            database_url,
            bind_host,
            bind_port,
            high_risk_countries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_high_risk_countries_list() {
        env::set_var("DATABASE_URL", "postgres://localhost/test");
        env::set_var("RISK_HIGH_RISK_COUNTRIES", "ng, ru , cn");
        let config = RiskEngineConfig::from_env().unwrap();
        assert!(config.high_risk_countries.contains("NG"));
        assert!(config.high_risk_countries.contains("RU"));
        assert!(config.high_risk_countries.contains("CN"));
        env::remove_var("RISK_HIGH_RISK_COUNTRIES");
        env::remove_var("DATABASE_URL");
    }
}
