use std::collections::HashSet;

use crate::assessment::RiskFactor;
use crate::geo::GeoInfo;
use crate::order::OrderData;
use crate::weights::RiskWeights;

/// Signal 3: up to four independent factors from a
/// resolved `GeoInfo` plus the tenant's high-risk country set. `geo` is
/// `None` when the lookup failed or wasn't attempted; the signal then
/// contributes nothing, matching "degrade silently".
pub fn score_geo(
    order: &OrderData,
    geo: Option<&GeoInfo>,
    high_risk_countries: &HashSet<String>,
    weights: &RiskWeights,
) -> Vec<RiskFactor> {
    let Some(geo) = geo else { return Vec::new() };
    let mut factors = Vec::new();

    if let Some(country) = &geo.country {
        if high_risk_countries.iter().any(|c| c.eq_ignore_ascii_case(country)) {
            factors.push(RiskFactor::new(
                "geo_high_risk_country",
                format!("{country} is a tenant-configured high-risk country"),
                35.0,
                weights.geo_mismatch,
            ));
        }

        if let Some(shipping) = &order.shipping_country {
            if !shipping.eq_ignore_ascii_case(country) {
                factors.push(RiskFactor::new(
                    "geo_country_mismatch",
                    format!("IP country {country} disagrees with shipping country {shipping}"),
                    25.0,
                    weights.geo_mismatch,
                ));
            }
        }
    }

    if geo.is_proxy || geo.is_vpn || geo.is_tor {
        factors.push(RiskFactor::new(
            "geo_proxy_vpn_tor",
            "request originated from a proxy, VPN, or Tor exit node",
            30.0,
            weights.proxy_vpn,
        ));
    }

    if geo.is_hosting {
        factors.push(RiskFactor::new(
            "geo_hosting",
            "request originated from a datacenter/hosting IP range",
            25.0,
            weights.geo_mismatch,
        ));
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn order(shipping: Option<&str>) -> OrderData {
        OrderData {
            order_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            amount: BigDecimal::from(10),
            customer_email: "buyer@example.com".into(),
            customer_phone: None,
            shipping_country: shipping.map(String::from),
            shipping_city: None,
            ip: Some("1.2.3.4".into()),
            card_bin: None,
            device_id: None,
            is_new_customer: false,
            item_count: 1,
            payment_method: "card".into(),
            promo_code: None,
        }
    }

    #[test]
    fn missing_geo_contributes_nothing() {
        let factors = score_geo(&order(Some("US")), None, &HashSet::new(), &RiskWeights::default());
        assert!(factors.is_empty());
    }

    #[test]
    fn country_mismatch_detected() {
        let geo = GeoInfo {
            country: Some("RU".into()),
            ..Default::default()
        };
        let factors = score_geo(&order(Some("US")), Some(&geo), &HashSet::new(), &RiskWeights::default());
        assert!(factors.iter().any(|f| f.name == "geo_country_mismatch"));
    }

    #[test]
    fn high_risk_country_detected() {
        let geo = GeoInfo {
            country: Some("XX".into()),
            ..Default::default()
        };
        let mut high_risk = HashSet::new();
        high_risk.insert("XX".to_string());
        let factors = score_geo(&order(Some("XX")), Some(&geo), &high_risk, &RiskWeights::default());
        assert!(factors.iter().any(|f| f.name == "geo_high_risk_country"));
        assert!(!factors.iter().any(|f| f.name == "geo_country_mismatch"));
    }

    #[test]
    fn proxy_vpn_tor_detected() {
        let geo = GeoInfo {
            is_vpn: true,
            ..Default::default()
        };
        let factors = score_geo(&order(None), Some(&geo), &HashSet::new(), &RiskWeights::default());
        assert!(factors.iter().any(|f| f.name == "geo_proxy_vpn_tor"));
    }
}
