use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::OrderData;

/// Heterogeneous rule condition value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
    List(Vec<ConditionValue>),
}

impl ConditionValue {
    /// Numeric coercion for arithmetic operators:
    /// integers widen, parse failure yields 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            ConditionValue::Number(n) => *n,
            ConditionValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            ConditionValue::List(_) => 0.0,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            ConditionValue::Number(n) => n.to_string(),
            ConditionValue::Text(s) => s.clone(),
            ConditionValue::List(items) => items.iter().map(ConditionValue::as_text).collect::<Vec<_>>().join(","),
        }
    }

    fn contains_case_insensitive(&self, needle: &ConditionValue) -> bool {
        self.as_text().to_lowercase().contains(&needle.as_text().to_lowercase())
    }

    fn membership(&self, haystack: &ConditionValue) -> bool {
        match haystack {
            ConditionValue::List(items) => items.iter().any(|item| {
                item.as_text().eq_ignore_ascii_case(&self.as_text())
            }),
            other => other.as_text().eq_ignore_ascii_case(&self.as_text()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logic {
    And,
    Or,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
    /// How this condition's result combines with the accumulated result
    /// of all prior conditions. Ignored on the first condition.
    pub logic: Logic,
}

impl Condition {
    fn matches(&self, order: &OrderData) -> bool {
        let Some(field_value) = resolve_field(order, &self.field) else {
            return false;
        };
        match self.operator {
            Operator::Eq => field_value.as_text().eq_ignore_ascii_case(&self.value.as_text()),
            Operator::Ne => !field_value.as_text().eq_ignore_ascii_case(&self.value.as_text()),
            Operator::Gt => field_value.as_f64() > self.value.as_f64(),
            Operator::Lt => field_value.as_f64() < self.value.as_f64(),
            Operator::Gte => field_value.as_f64() >= self.value.as_f64(),
            Operator::Lte => field_value.as_f64() <= self.value.as_f64(),
            Operator::Contains => field_value.contains_case_insensitive(&self.value),
            Operator::In => field_value.membership(&self.value),
        }
    }
}

fn resolve_field(order: &OrderData, field: &str) -> Option<ConditionValue> {
    Some(match field {
        "amount" => ConditionValue::Number(order.amount.to_string().parse().unwrap_or(0.0)),
        "customer_email" => ConditionValue::Text(order.customer_email.clone()),
        "customer_phone" => ConditionValue::Text(order.customer_phone.clone()?),
        "shipping_country" => ConditionValue::Text(order.shipping_country.clone()?),
        "shipping_city" => ConditionValue::Text(order.shipping_city.clone()?),
        "ip" => ConditionValue::Text(order.ip.clone()?),
        "is_new_customer" => ConditionValue::Text(order.is_new_customer.to_string()),
        "item_count" => ConditionValue::Number(order.item_count as f64),
        "payment_method" => ConditionValue::Text(order.payment_method.clone()),
        "promo_code" => ConditionValue::Text(order.promo_code.clone()?),
        "email_domain" => ConditionValue::Text(order.email_domain()?.to_string()),
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Flag,
    Block,
    Review,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub action: RuleAction,
    pub added_score: f64,
    pub active: bool,
    pub priority: i32,
    pub match_count: i64,
}

impl FraudRule {
    /// Deterministic left-to-right evaluation with no operator precedence
    ///: `result := first.match`; for i >= 1,
    /// `result := logic_{i-1} == or ? result || match_i : result && match_i`.
    /// Deliberately not short-circuited by precedence — an "or" mid-chain
    /// behaves like a fold, exactly as specified.
    pub fn matches(&self, order: &OrderData) -> bool {
        let mut conditions = self.conditions.iter();
        let Some(first) = conditions.next() else {
            return false;
        };
        let mut result = first.matches(order);
        for condition in conditions {
            let this_match = condition.matches(order);
            result = match condition.logic {
                Logic::Or => result || this_match,
                Logic::And => result && this_match,
            };
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn order(amount: i64, country: &str) -> OrderData {
        OrderData {
            order_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            amount: BigDecimal::from(amount),
            customer_email: "buyer@example.com".into(),
            customer_phone: None,
            shipping_country: Some(country.into()),
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

    fn rule(conditions: Vec<Condition>) -> FraudRule {
        FraudRule {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "test".into(),
            conditions,
            action: RuleAction::Flag,
            added_score: 30.0,
            active: true,
            priority: 0,
            match_count: 0,
        }
    }

    #[test]
    fn single_condition_matches() {
        let r = rule(vec![Condition {
            field: "amount".into(),
            operator: Operator::Gt,
            value: ConditionValue::Number(50.0),
            logic: Logic::And,
        }]);
        assert!(r.matches(&order(100, "US")));
        assert!(!r.matches(&order(10, "US")));
    }

    #[test]
    fn left_fold_has_no_precedence() {
        // amount > 1000 AND country == "US" OR country == "CA"
        // Fold: ((amount>1000 AND US) OR CA) -- left to right, no precedence grouping.
        let conditions = vec![
            Condition {
                field: "amount".into(),
                operator: Operator::Gt,
                value: ConditionValue::Number(1000.0),
                logic: Logic::And,
            },
            Condition {
                field: "shipping_country".into(),
                operator: Operator::Eq,
                value: ConditionValue::Text("US".into()),
                logic: Logic::And,
            },
            Condition {
                field: "shipping_country".into(),
                operator: Operator::Eq,
                value: ConditionValue::Text("CA".into()),
                logic: Logic::Or,
            },
        ];
        let r = rule(conditions);
        // amount=100 (not > 1000), country=CA: fold is ((false AND false) OR true) = true
        assert!(r.matches(&order(100, "CA")));
    }

    #[test]
    fn undefined_field_is_false() {
        let r = rule(vec![Condition {
            field: "nonexistent_field".into(),
            operator: Operator::Eq,
            value: ConditionValue::Text("x".into()),
            logic: Logic::And,
        }]);
        assert!(!r.matches(&order(100, "US")));
    }

    #[test]
    fn no_conditions_never_matches() {
        let r = rule(vec![]);
        assert!(!r.matches(&order(100, "US")));
    }

    #[test]
    fn in_operator_checks_membership() {
        let r = rule(vec![Condition {
            field: "shipping_country".into(),
            operator: Operator::In,
            value: ConditionValue::List(vec![
                ConditionValue::Text("US".into()),
                ConditionValue::Text("CA".into()),
            ]),
            logic: Logic::And,
        }]);
        assert!(r.matches(&order(10, "CA")));
        assert!(!r.matches(&order(10, "FR")));
    }

    #[test]
    fn numeric_coercion_on_text_parses_or_defaults_zero() {
        let value = ConditionValue::Text("not-a-number".into());
        assert_eq!(value.as_f64(), 0.0);
        let value = ConditionValue::Text("42".into());
        assert_eq!(value.as_f64(), 42.0);
    }
}
