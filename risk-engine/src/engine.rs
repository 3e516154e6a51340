use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::assessment::RiskAssessment;
use crate::geo::GeoResolver;
use crate::order::OrderData;
use crate::signals;
use crate::store::RiskStore;
use crate::weights::RiskWeights;

#[derive(Debug, Error)]
pub enum RiskEngineError {
    #[error("failed to persist risk assessment: {0}")]
    Persist(#[from] sqlx::Error),
}

/// Composes the seven risk signals into a single
/// `RiskAssessment` and persists it. Follows the same
/// small-pure-functions-composed-by-a-caller style used for policy
/// checks elsewhere in this codebase, generalized from a
/// single authorization check to a weighted-sum scoring pipeline.
#[derive(Clone)]
pub struct RiskEngine {
    store: RiskStore,
    geo: Arc<dyn GeoResolver>,
    weights: RiskWeights,
    high_risk_countries: HashSet<String>,
}

impl RiskEngine {
    pub fn new(
        store: RiskStore,
        geo: Arc<dyn GeoResolver>,
        weights: RiskWeights,
        high_risk_countries: HashSet<String>,
    ) -> Self {
        Self {
            store,
            geo,
            weights,
            high_risk_countries,
        }
    }

    /// `assess(order)`.F: deterministic for identical
    /// inputs and a stable rule set. Individual signal failures degrade
    /// silently; only the final persist is fatal to the call.
    pub async fn assess(&self, order: &OrderData) -> Result<RiskAssessment, RiskEngineError> {
        let blacklist = self
            .store
            .list_live_blacklist(order.tenant_id)
            .await
            .unwrap_or_else(|err| {
                warn!(?err, "blacklist lookup failed, degrading silently");
                Vec::new()
            });
        let rules = self
            .store
            .list_active_rules(order.tenant_id)
            .await
            .unwrap_or_else(|err| {
                warn!(?err, "rule lookup failed, degrading silently");
                Vec::new()
            });
        let velocity_counts = self.store.velocity_counts(order.tenant_id, order).await;
        let (prior_order_count, historical_average) = self
            .store
            .customer_history(order.tenant_id, &order.customer_email)
            .await
            .unwrap_or_else(|err| {
                warn!(?err, "customer history lookup failed, degrading silently");
                (0, None)
            });
        let geo = match self.geo.resolve(order.ip.as_deref().unwrap_or_default()).await {
            Some(geo) => Some(geo),
            None => None,
        };

        let mut order = order.clone();
        order.is_new_customer = order.is_new_customer || prior_order_count == 0;

        let mut factors = Vec::new();
        factors.extend(signals::score_blacklist(&order, &blacklist, &self.weights));
        factors.extend(signals::score_velocity(&order, &velocity_counts, &self.weights));
        factors.extend(signals::score_geo(&order, geo.as_ref(), &self.high_risk_countries, &self.weights));
        factors.extend(signals::score_email_pattern(&order, &self.weights));
        factors.extend(signals::score_amount_anomaly(&order, historical_average.as_ref(), &self.weights));
        factors.extend(signals::score_new_customer(&order, &self.weights));

        let (custom_factors, matched_rule_ids) = signals::score_custom_rules(&order, &rules, &self.weights);
        factors.extend(custom_factors);
        if let Err(err) = self.store.increment_rule_match_counts(&matched_rule_ids).await {
            warn!(?err, "failed to update rule match counters");
        }

        let assessment = RiskAssessment::new(order.tenant_id, order.order_id, factors, &self.weights.thresholds);

        self.store.save_assessment(&assessment).await?;
        if let Err(err) = self.store.record_order_event(&order).await {
            warn!(?err, "failed to record order history for future velocity/amount signals");
        }

        Ok(assessment)
    }

    /// Sets reviewer/decision/notes on an existing assessment without
    /// re-running the engine.
    pub async fn review(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        reviewer: &str,
        decision: &str,
        notes: Option<&str>,
    ) -> Result<Option<RiskAssessment>, RiskEngineError> {
        Ok(self.store.review(tenant_id, order_id, reviewer, decision, notes).await?)
    }

    pub async fn list_assessments(
        &self,
        tenant_id: Uuid,
        risk_level: Option<crate::assessment::RiskLevel>,
        from: Option<chrono::DateTime<chrono::Utc>>,
        to: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<RiskAssessment>, RiskEngineError> {
        Ok(self.store.list_assessments(tenant_id, risk_level, from, to).await?)
    }
}
