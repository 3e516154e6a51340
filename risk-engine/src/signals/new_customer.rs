use crate::assessment::RiskFactor;
use crate::order::OrderData;
use crate::weights::RiskWeights;

/// Signal 6: a flat (15) factor when the buyer has no
/// prior orders.
pub fn score_new_customer(order: &OrderData, weights: &RiskWeights) -> Vec<RiskFactor> {
    if order.is_new_customer {
        vec![RiskFactor::new(
            "new_customer",
            "buyer has no prior orders with this tenant",
            15.0,
            weights.new_customer,
        )]
    } else {
        Vec::new()
    }
}
