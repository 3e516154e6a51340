use uuid::Uuid;

use crate::assessment::RiskFactor;
use crate::order::OrderData;
use crate::rules::FraudRule;
use crate::weights::RiskWeights;

/// Signal 7: each matching active rule contributes
/// `(rule.score, weight_custom_rule)`. Returns the factors plus the ids
/// of rules that matched, so the caller can atomically bump each rule's
/// match counter in the repository (scoring itself stays a pure
/// function of `order` and `rules`).
pub fn score_custom_rules(order: &OrderData, rules: &[FraudRule], weights: &RiskWeights) -> (Vec<RiskFactor>, Vec<Uuid>) {
    let mut factors = Vec::new();
    let mut matched_ids = Vec::new();

    for rule in rules.iter().filter(|r| r.active) {
        if rule.matches(order) {
            factors.push(RiskFactor::new(
                format!("custom_rule:{}", rule.name),
                format!("tenant rule '{}' matched", rule.name),
                rule.added_score,
                weights.custom_rule,
            ));
            matched_ids.push(rule.id);
        }
    }

    (factors, matched_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Condition, ConditionValue, Logic, Operator, RuleAction};
    use bigdecimal::BigDecimal;

    fn order() -> OrderData {
        OrderData {
            order_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            amount: BigDecimal::from(5000),
            customer_email: "buyer@example.com".into(),
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

    fn rule(active: bool) -> FraudRule {
        FraudRule {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "big_order".into(),
            conditions: vec![Condition {
                field: "amount".into(),
                operator: Operator::Gt,
                value: ConditionValue::Number(1000.0),
                logic: Logic::And,
            }],
            action: RuleAction::Flag,
            added_score: 30.0,
            active,
            priority: 0,
            match_count: 0,
        }
    }

    #[test]
    fn matching_active_rule_contributes_and_is_reported() {
        let rules = vec![rule(true)];
        let (factors, matched) = score_custom_rules(&order(), &rules, &RiskWeights::default());
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].raw_score, 30.0);
        assert_eq!(matched, vec![rules[0].id]);
    }

    #[test]
    fn inactive_rule_is_skipped() {
        let rules = vec![rule(false)];
        let (factors, matched) = score_custom_rules(&order(), &rules, &RiskWeights::default());
        assert!(factors.is_empty());
        assert!(matched.is_empty());
    }
}
