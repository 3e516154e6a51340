use crate::assessment::RiskFactor;
use crate::blacklist::{BlacklistEntry, BlacklistType};
use crate::order::OrderData;
use crate::weights::RiskWeights;

/// Signal 1: each populated attribute in {email, phone,
/// ip, card_bin, device} checked against the tenant blacklist; a hit
/// contributes `(50, weight_blacklist)`. `entries` is assumed to already
/// be filtered to live (non-expired) rows for this tenant.
pub fn score_blacklist(order: &OrderData, entries: &[BlacklistEntry], weights: &RiskWeights) -> Vec<RiskFactor> {
    let candidates: [(BlacklistType, Option<&str>); 5] = [
        (BlacklistType::Email, Some(order.customer_email.as_str())),
        (BlacklistType::Phone, order.customer_phone.as_deref()),
        (BlacklistType::Ip, order.ip.as_deref()),
        (BlacklistType::CardBin, order.card_bin.as_deref()),
        (BlacklistType::Device, order.device_id.as_deref()),
    ];

    let mut factors = Vec::new();
    for (kind, value) in candidates {
        let Some(value) = value else { continue };
        let hit = entries
            .iter()
            .any(|entry| entry.entry_type == kind && entry.value.eq_ignore_ascii_case(value));
        if hit {
            factors.push(RiskFactor::new(
                "blacklist",
                format!("{} matched tenant blacklist", kind.as_str()),
                50.0,
                weights.blacklist,
            ));
        }
    }
    factors
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
            customer_email: "blocked@example.com".into(),
            customer_phone: None,
            shipping_country: None,
            shipping_city: None,
            ip: None,
            card_bin: None,
            device_id: None,
            is_new_customer: true,
            item_count: 1,
            payment_method: "card".into(),
            promo_code: None,
        }
    }

    #[test]
    fn matching_email_contributes_one_factor() {
        let tenant_id = Uuid::new_v4();
        let entries = vec![BlacklistEntry {
            id: Uuid::new_v4(),
            tenant_id,
            entry_type: BlacklistType::Email,
            value: "blocked@example.com".into(),
            reason: None,
            expires_at: None,
        }];
        let factors = score_blacklist(&order(), &entries, &RiskWeights::default());
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].raw_score, 50.0);
    }

    #[test]
    fn no_match_contributes_nothing() {
        let factors = score_blacklist(&order(), &[], &RiskWeights::default());
        assert!(factors.is_empty());
    }
}
