use bigdecimal::{BigDecimal, ToPrimitive};

use crate::assessment::RiskFactor;
use crate::order::OrderData;
use crate::weights::RiskWeights;

/// Signal 5. `historical_average` is `None` for a
/// first-time customer (handled by the new-customer flat factor
/// instead) or when the repository lookup degrades silently.
pub fn score_amount_anomaly(
    order: &OrderData,
    historical_average: Option<&BigDecimal>,
    weights: &RiskWeights,
) -> Vec<RiskFactor> {
    let mut factors = Vec::new();
    let amount = order.amount.to_f64().unwrap_or(0.0);

    if order.is_new_customer {
        if amount > 10_000.0 {
            factors.push(RiskFactor::new(
                "amount_new_customer_high",
                "new customer's order exceeds 10,000",
                25.0,
                weights.high_amount,
            ));
        }
        return factors;
    }

    if let Some(average) = historical_average {
        let average = average.to_f64().unwrap_or(0.0);
        if average > 0.0 && amount > 3.0 * average {
            factors.push(RiskFactor::new(
                "amount_returning_customer_spike",
                format!("order amount {amount:.2} exceeds 3x historical average {average:.2}"),
                20.0,
                weights.high_amount,
            ));
        }
    }

    factors
}
