use crate::assessment::RiskFactor;
use crate::order::OrderData;
use crate::weights::RiskWeights;

const DISPOSABLE_TOKENS: &[&str] = &[
    "mailinator", "tempmail", "guerrillamail", "10minutemail", "trashmail", "yopmail", "throwaway",
];

/// Signal 4. Lowercases the email first; checks the local
/// part for disposable-provider tokens, then for a "random-looking"
/// pattern when long enough.
pub fn score_email_pattern(order: &OrderData, weights: &RiskWeights) -> Vec<RiskFactor> {
    let email = order.customer_email.to_lowercase();
    let Some((local, _domain)) = email.split_once('@') else {
        return Vec::new();
    };

    let mut factors = Vec::new();

    if DISPOSABLE_TOKENS.iter().any(|token| email.contains(token)) {
        factors.push(RiskFactor::new(
            "email_disposable",
            "email local/domain part matches a disposable-provider token",
            40.0,
            weights.email_pattern,
        ));
    }

    if local.len() > 15 && looks_random(local) {
        factors.push(RiskFactor::new(
            "email_random_looking",
            "email local part is long and exhibits a random-looking character mix",
            20.0,
            weights.email_pattern,
        ));
    }

    factors
}

/// Ratio of digits > 0.3 or ratio of vowels < 0.1.
fn looks_random(local: &str) -> bool {
    let len = local.chars().count() as f64;
    if len == 0.0 {
        return false;
    }
    let digits = local.chars().filter(|c| c.is_ascii_digit()).count() as f64;
    let vowels = local
        .chars()
        .filter(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .count() as f64;

    (digits / len) > 0.3 || (vowels / len) < 0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn order_with_email(email: &str) -> OrderData {
        OrderData {
            order_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            amount: BigDecimal::from(10),
            customer_email: email.into(),
            customer_phone: None,
            shipping_country: None,
            shipping_city: None,
            ip: None,
            card_bin: None,
            device_id: None,
            is_new_customer: false,
            item_count: 1,
            payment_method: "card".into(),
            promo_code: None,
        }
    }

    #[test]
    fn disposable_provider_detected() {
        let factors = score_email_pattern(&order_with_email("foo@mailinator.com"), &RiskWeights::default());
        assert!(factors.iter().any(|f| f.name == "email_disposable"));
    }

    #[test]
    fn random_looking_long_local_part_detected() {
        let factors = score_email_pattern(&order_with_email("xk7q9z3m1p8w2r4t@example.com"), &RiskWeights::default());
        assert!(factors.iter().any(|f| f.name == "email_random_looking"));
    }

    #[test]
    fn ordinary_email_contributes_nothing() {
        let factors = score_email_pattern(&order_with_email("jane.doe@example.com"), &RiskWeights::default());
        assert!(factors.is_empty());
    }
}
