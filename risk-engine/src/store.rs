use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::assessment::{Recommendation, ReviewState, RiskAssessment, RiskFactor, RiskLevel};
use crate::blacklist::{BlacklistEntry, BlacklistType};
use crate::order::OrderData;
use crate::rules::{FraudRule, RuleAction};
use crate::signals::VELOCITY_PROBES;

/// Repository for fraud assessments, blacklist entries, and tenant
/// rules, plus the order-history rows the velocity and amount-anomaly
/// signals need. Uses plain `sqlx::query(...).bind` style (no
/// compile-time `query!` macros, runtime-checked) consistent with the
/// rest of this codebase's repositories.
#[derive(Clone)]
pub struct RiskStore {
    pool: PgPool,
}

impl RiskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_live_blacklist(&self, tenant_id: Uuid) -> Result<Vec<BlacklistEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, entry_type, value, reason, expires_at
             FROM fraud_blacklist
             WHERE tenant_id = $1 AND (expires_at IS NULL OR expires_at > now())",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let entry_type = BlacklistType::parse(row.try_get::<String, _>("entry_type").ok()?.as_str())?;
                Some(BlacklistEntry {
                    id: row.try_get("id").ok()?,
                    tenant_id: row.try_get("tenant_id").ok()?,
                    entry_type,
                    value: row.try_get("value").ok()?,
                    reason: row.try_get("reason").ok()?,
                    expires_at: row.try_get("expires_at").ok()?,
                })
            })
            .collect())
    }

    pub async fn list_active_rules(&self, tenant_id: Uuid) -> Result<Vec<FraudRule>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, name, conditions, action, added_score, active, priority, match_count
             FROM fraud_rules
             WHERE tenant_id = $1 AND active = true
             ORDER BY priority DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let conditions_json: serde_json::Value = row.try_get("conditions")?;
            let conditions = serde_json::from_value(conditions_json).unwrap_or_default();
            let action_str: String = row.try_get("action")?;
            let action = match action_str.as_str() {
                "block" => RuleAction::Block,
                "review" => RuleAction::Review,
                _ => RuleAction::Flag,
            };
            rules.push(FraudRule {
                id: row.try_get("id")?,
                tenant_id: row.try_get("tenant_id")?,
                name: row.try_get("name")?,
                conditions,
                action,
                added_score: row.try_get("added_score")?,
                active: row.try_get("active")?,
                priority: row.try_get("priority")?,
                match_count: row.try_get("match_count")?,
            });
        }
        Ok(rules)
    }

    pub async fn increment_rule_match_counts(&self, rule_ids: &[Uuid]) -> Result<(), sqlx::Error> {
        for id in rule_ids {
            sqlx::query("UPDATE fraud_rules SET match_count = match_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// One count per entry in `VELOCITY_PROBES`, in order. `None` when the
    /// relevant order field isn't populated; a query failure degrades to
    /// `None` rather than propagating, so individual signal failures
    /// degrade silently.
    pub async fn velocity_counts(&self, tenant_id: Uuid, order: &OrderData) -> Vec<Option<i64>> {
        let mut counts = Vec::with_capacity(VELOCITY_PROBES.len());
        for probe in VELOCITY_PROBES {
            let value = match probe.field {
                "customer_email" => Some(order.customer_email.clone()),
                "customer_phone" => order.customer_phone.clone(),
                "ip" => order.ip.clone(),
                "card_bin" => order.card_bin.clone(),
                _ => None,
            };
            let Some(value) = value else {
                counts.push(None);
                continue;
            };
            let since = Utc::now() - chrono::Duration::hours(probe.window_hours);
            let column = probe.field;
            let query = format!(
                "SELECT COUNT(*) AS n FROM risk_order_history WHERE tenant_id = $1 AND {column} = $2 AND occurred_at >= $3"
            );
            match sqlx::query(&query)
                .bind(tenant_id)
                .bind(&value)
                .bind(since)
                .fetch_one(&self.pool)
                .await
            {
                Ok(row) => counts.push(row.try_get::<i64, _>("n").ok()),
                Err(_) => counts.push(None),
            }
        }
        counts
    }

    /// `(prior_order_count, historical_average_amount)` for this tenant's
    /// customer, used by the new-customer and amount-anomaly signals.
    pub async fn customer_history(
        &self,
        tenant_id: Uuid,
        customer_email: &str,
    ) -> Result<(i64, Option<BigDecimal>), sqlx::Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n, AVG(amount) AS avg_amount
             FROM risk_order_history
             WHERE tenant_id = $1 AND customer_email = $2",
        )
        .bind(tenant_id)
        .bind(customer_email)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("n")?;
        let average: Option<BigDecimal> = row.try_get("avg_amount").ok().flatten();
        Ok((count, average))
    }

    pub async fn record_order_event(&self, order: &OrderData) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO risk_order_history
                (tenant_id, order_id, customer_email, customer_phone, ip, card_bin, amount, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, now())",
        )
        .bind(order.tenant_id)
        .bind(order.order_id)
        .bind(&order.customer_email)
        .bind(order.customer_phone.as_deref())
        .bind(order.ip.as_deref())
        .bind(order.card_bin.as_deref())
        .bind(&order.amount)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn save_assessment(&self, assessment: &RiskAssessment) -> Result<(), sqlx::Error> {
        let factors_json = serde_json::to_value(&assessment.factors).unwrap_or_default();
        sqlx::query(
            "INSERT INTO fraud_assessments
                (id, tenant_id, order_id, score, level, factors, recommendation, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(assessment.id)
        .bind(assessment.tenant_id)
        .bind(assessment.order_id)
        .bind(assessment.score)
        .bind(level_str(assessment.level))
        .bind(factors_json)
        .bind(recommendation_str(assessment.recommendation))
        .bind(assessment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_assessment_by_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<RiskAssessment>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, tenant_id, order_id, score, level, factors, recommendation, created_at,
                    reviewer, decision, review_notes, reviewed_at
             FROM fraud_assessments
             WHERE tenant_id = $1 AND order_id = $2
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_assessment))
    }

    pub async fn review(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        reviewer: &str,
        decision: &str,
        notes: Option<&str>,
    ) -> Result<Option<RiskAssessment>, sqlx::Error> {
        sqlx::query(
            "UPDATE fraud_assessments
             SET reviewer = $3, decision = $4, review_notes = $5, reviewed_at = now()
             WHERE tenant_id = $1 AND order_id = $2",
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(reviewer)
        .bind(decision)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        self.find_assessment_by_order(tenant_id, order_id).await
    }

    /// All blacklist entries for a tenant, live or expired — management
    /// listings show the full history, unlike `list_live_blacklist` which
    /// the engine consults during scoring.
    pub async fn list_blacklist(&self, tenant_id: Uuid) -> Result<Vec<BlacklistEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, entry_type, value, reason, expires_at
             FROM fraud_blacklist WHERE tenant_id = $1 ORDER BY id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let entry_type = BlacklistType::parse(row.try_get::<String, _>("entry_type").ok()?.as_str())?;
                Some(BlacklistEntry {
                    id: row.try_get("id").ok()?,
                    tenant_id: row.try_get("tenant_id").ok()?,
                    entry_type,
                    value: row.try_get("value").ok()?,
                    reason: row.try_get("reason").ok()?,
                    expires_at: row.try_get("expires_at").ok()?,
                })
            })
            .collect())
    }

    pub async fn create_blacklist_entry(
        &self,
        tenant_id: Uuid,
        entry_type: BlacklistType,
        value: &str,
        reason: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<BlacklistEntry, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO fraud_blacklist (id, tenant_id, entry_type, value, reason, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(entry_type.as_str())
        .bind(value)
        .bind(reason)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(BlacklistEntry {
            id,
            tenant_id,
            entry_type,
            value: value.to_string(),
            reason: reason.map(str::to_string),
            expires_at,
        })
    }

    /// `Ok(true)` if a row scoped to this tenant was deleted.
    pub async fn delete_blacklist_entry(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fraud_blacklist WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All rules for a tenant regardless of `active`, for management
    /// listings; `list_active_rules` is the scoring-time view.
    pub async fn list_rules(&self, tenant_id: Uuid) -> Result<Vec<FraudRule>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, name, conditions, action, added_score, active, priority, match_count
             FROM fraud_rules WHERE tenant_id = $1 ORDER BY priority DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_rule).collect()
    }

    pub async fn get_rule(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<FraudRule>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, conditions, action, added_score, active, priority, match_count
             FROM fraud_rules WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_rule).transpose()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_rule(
        &self,
        tenant_id: Uuid,
        name: &str,
        conditions: &[crate::rules::Condition],
        action: RuleAction,
        added_score: f64,
        active: bool,
        priority: i32,
    ) -> Result<FraudRule, sqlx::Error> {
        let id = Uuid::new_v4();
        let conditions_json = serde_json::to_value(conditions).unwrap_or_default();
        sqlx::query(
            "INSERT INTO fraud_rules (id, tenant_id, name, conditions, action, added_score, active, priority, match_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .bind(&conditions_json)
        .bind(action_str(action))
        .bind(added_score)
        .bind(active)
        .bind(priority)
        .execute(&self.pool)
        .await?;

        Ok(FraudRule {
            id,
            tenant_id,
            name: name.to_string(),
            conditions: conditions.to_vec(),
            action,
            added_score,
            active,
            priority,
            match_count: 0,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_rule(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: &str,
        conditions: &[crate::rules::Condition],
        action: RuleAction,
        added_score: f64,
        active: bool,
        priority: i32,
    ) -> Result<Option<FraudRule>, sqlx::Error> {
        let conditions_json = serde_json::to_value(conditions).unwrap_or_default();
        let result = sqlx::query(
            "UPDATE fraud_rules
             SET name = $3, conditions = $4, action = $5, added_score = $6, active = $7, priority = $8
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .bind(&conditions_json)
        .bind(action_str(action))
        .bind(added_score)
        .bind(active)
        .bind(priority)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_rule(tenant_id, id).await
    }

    pub async fn delete_rule(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fraud_rules WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_assessments(
        &self,
        tenant_id: Uuid,
        risk_level: Option<RiskLevel>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<RiskAssessment>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, order_id, score, level, factors, recommendation, created_at,
                    reviewer, decision, review_notes, reviewed_at
             FROM fraud_assessments
             WHERE tenant_id = $1
               AND ($2::text IS NULL OR level = $2)
               AND ($3::timestamptz IS NULL OR created_at >= $3)
               AND ($4::timestamptz IS NULL OR created_at <= $4)
             ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .bind(risk_level.map(level_str))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_assessment).collect())
    }
}

fn row_to_rule(row: sqlx::postgres::PgRow) -> Result<FraudRule, sqlx::Error> {
    let conditions_json: serde_json::Value = row.try_get("conditions")?;
    let conditions = serde_json::from_value(conditions_json).unwrap_or_default();
    let action_raw: String = row.try_get("action")?;
    Ok(FraudRule {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        conditions,
        action: parse_action(&action_raw),
        added_score: row.try_get("added_score")?,
        active: row.try_get("active")?,
        priority: row.try_get("priority")?,
        match_count: row.try_get("match_count")?,
    })
}

fn action_str(action: RuleAction) -> &'static str {
    match action {
        RuleAction::Flag => "flag",
        RuleAction::Block => "block",
        RuleAction::Review => "review",
    }
}

fn parse_action(value: &str) -> RuleAction {
    match value {
        "block" => RuleAction::Block,
        "review" => RuleAction::Review,
        _ => RuleAction::Flag,
    }
}

fn level_str(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low",
        RiskLevel::Medium => "medium",
        RiskLevel::High => "high",
        RiskLevel::Critical => "critical",
    }
}

fn parse_level(value: &str) -> RiskLevel {
    match value {
        "critical" => RiskLevel::Critical,
        "high" => RiskLevel::High,
        "medium" => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

fn recommendation_str(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::Approve => "approve",
        Recommendation::Review => "review",
        Recommendation::Reject => "reject",
    }
}

fn parse_recommendation(value: &str) -> Recommendation {
    match value {
        "reject" => Recommendation::Reject,
        "review" => Recommendation::Review,
        _ => Recommendation::Approve,
    }
}

fn row_to_assessment(row: sqlx::postgres::PgRow) -> RiskAssessment {
    let factors_json: serde_json::Value = row.try_get("factors").unwrap_or_default();
    let factors: Vec<RiskFactor> = serde_json::from_value(factors_json).unwrap_or_default();
    let level_raw: String = row.try_get("level").unwrap_or_default();
    let recommendation_raw: String = row.try_get("recommendation").unwrap_or_default();

    RiskAssessment {
        id: row.try_get("id").unwrap_or_default(),
        tenant_id: row.try_get("tenant_id").unwrap_or_default(),
        order_id: row.try_get("order_id").unwrap_or_default(),
        score: row.try_get("score").unwrap_or_default(),
        level: parse_level(&level_raw),
        factors,
        recommendation: parse_recommendation(&recommendation_raw),
        review: ReviewState {
            reviewer: row.try_get("reviewer").ok(),
            decision: row.try_get("decision").ok(),
            notes: row.try_get("review_notes").ok(),
            reviewed_at: row.try_get("reviewed_at").ok(),
        },
        created_at: row.try_get("created_at").unwrap_or_else(|_| Utc::now()),
    }
}
