use crate::assessment::RiskLevelThresholds;

/// Per-signal weights and level thresholds, loaded once at startup and
/// handed around as `Arc`.
/// Follows the `GatewayConfig`/`JwtConfig` pattern of a plain struct
/// built from env or defaults at boot, not runtime-mutable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskWeights {
    pub blacklist: f64,
    pub velocity: f64,
    pub proxy_vpn: f64,
    pub geo_mismatch: f64,
    pub high_amount: f64,
    pub email_pattern: f64,
    pub new_customer: f64,
    pub custom_rule: f64,
    pub thresholds: RiskLevelThresholds,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            blacklist: 2.0,
            velocity: 1.5,
            proxy_vpn: 1.4,
            geo_mismatch: 1.3,
            high_amount: 1.2,
            email_pattern: 1.1,
            new_customer: 1.0,
            custom_rule: 1.0,
            thresholds: RiskLevelThresholds::default(),
        }
    }
}

impl RiskWeights {
    pub fn from_env() -> Self {
        let mut weights = Self::default();
        if let Some(v) = env_f64("RISK_WEIGHT_BLACKLIST") {
            weights.blacklist = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_VELOCITY") {
            weights.velocity = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_PROXY_VPN") {
            weights.proxy_vpn = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_GEO_MISMATCH") {
            weights.geo_mismatch = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_HIGH_AMOUNT") {
            weights.high_amount = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_EMAIL_PATTERN") {
            weights.email_pattern = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_NEW_CUSTOMER") {
            weights.new_customer = v;
        }
        if let Some(v) = env_f64("RISK_WEIGHT_CUSTOM_RULE") {
            weights.custom_rule = v;
        }
        weights
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse::<f64>().ok())
}
