use crate::assessment::RiskFactor;
use crate::order::OrderData;
use crate::weights::RiskWeights;

/// One probe in the fixed velocity set.
#[derive(Debug, Clone, Copy)]
pub struct VelocityProbe {
    pub field: &'static str,
    pub window_hours: i64,
    pub max_count: i64,
}

/// Representative fixed set: email×1h/3,
/// email×24h/5, ip×1h/5, card_bin×1h/3, phone×24h/5.
pub const VELOCITY_PROBES: &[VelocityProbe] = &[
    VelocityProbe { field: "customer_email", window_hours: 1, max_count: 3 },
    VelocityProbe { field: "customer_email", window_hours: 24, max_count: 5 },
    VelocityProbe { field: "ip", window_hours: 1, max_count: 5 },
    VelocityProbe { field: "card_bin", window_hours: 1, max_count: 3 },
    VelocityProbe { field: "customer_phone", window_hours: 24, max_count: 5 },
];

/// Observed counts for each probe over its window, keyed by probe index
/// into `VELOCITY_PROBES`. Populated by the caller from a repository
/// query; kept separate from the scoring function so the function stays
/// a pure, independently testable computation over given counts.
pub type VelocityCounts = Vec<Option<i64>>;

/// For each probe whose observed count >= max, contribute
/// `(20 + 10*(count - max), weight_velocity)`.
/// A probe is skipped if its field isn't populated on the order or its
/// count wasn't supplied (lookup failure degrades silently).
pub fn score_velocity(order: &OrderData, counts: &VelocityCounts, weights: &RiskWeights) -> Vec<RiskFactor> {
    let mut factors = Vec::new();
    for (probe, count) in VELOCITY_PROBES.iter().zip(counts.iter()) {
        if !field_populated(order, probe.field) {
            continue;
        }
        let Some(count) = count else { continue };
        if *count >= probe.max_count {
            let raw_score = 20.0 + 10.0 * ((*count - probe.max_count) as f64);
            factors.push(RiskFactor::new(
                "velocity",
                format!(
                    "{} exceeded {} in {}h window ({} >= {})",
                    probe.field, probe.max_count, probe.window_hours, count, probe.max_count
                ),
                raw_score,
                weights.velocity,
            ));
        }
    }
    factors
}

fn field_populated(order: &OrderData, field: &str) -> bool {
    match field {
        "customer_email" => !order.customer_email.is_empty(),
        "customer_phone" => order.customer_phone.is_some(),
        "ip" => order.ip.is_some(),
        "card_bin" => order.card_bin.is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn order() -> OrderData {
        OrderData {
            order_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            amount: BigDecimal::from(10),
            customer_email: "buyer@example.com".into(),
            customer_phone: Some("+10000000000".into()),
            shipping_country: None,
            shipping_city: None,
            ip: Some("1.2.3.4".into()),
            card_bin: Some("411111".into()),
            device_id: None,
            is_new_customer: false,
            item_count: 1,
            payment_method: "card".into(),
            promo_code: None,
        }
    }

    #[test]
    fn count_at_threshold_contributes_base_score() {
        // email 1h probe: max_count 3
        let counts: VelocityCounts = vec![Some(3), None, None, None, None];
        let factors = score_velocity(&order(), &counts, &RiskWeights::default());
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].raw_score, 20.0);
    }

    #[test]
    fn count_over_threshold_scales_with_overage() {
        let counts: VelocityCounts = vec![Some(5), None, None, None, None];
        let factors = score_velocity(&order(), &counts, &RiskWeights::default());
        assert_eq!(factors[0].raw_score, 40.0);
    }

    #[test]
    fn count_under_threshold_contributes_nothing() {
        let counts: VelocityCounts = vec![Some(1), None, None, None, None];
        let factors = score_velocity(&order(), &counts, &RiskWeights::default());
        assert!(factors.is_empty());
    }
}
