use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input bundle for `RiskEngine::assess`. Also the field source for the rule evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderData {
    pub order_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: BigDecimal,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_city: Option<String>,
    pub ip: Option<String>,
    pub card_bin: Option<String>,
    pub device_id: Option<String>,
    pub is_new_customer: bool,
    pub item_count: i64,
    pub payment_method: String,
    pub promo_code: Option<String>,
}

impl OrderData {
    /// Derived field exposed to the rule evaluator alongside the literal
    /// ones.
    pub fn email_domain(&self) -> Option<&str> {
        self.customer_email.split('@').nth(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OrderData {
        OrderData {
            order_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            amount: BigDecimal::from(100),
            customer_email: "buyer@example.com".into(),
            customer_phone: None,
            shipping_country: Some("US".into()),
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
    fn email_domain_is_derived() {
        assert_eq!(sample().email_domain(), Some("example.com"));
    }
}
