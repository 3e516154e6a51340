use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One contributing signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub description: String,
    pub raw_score: f64,
    pub weight: f64,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, raw_score: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            raw_score,
            weight,
        }
    }

    pub fn contribution(&self) -> f64 {
        self.raw_score * self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Default thresholds; deployments may
    /// override via `RiskWeights`-adjacent config, but the mapping shape
    /// itself is fixed.
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            RiskLevel::Critical => Recommendation::Reject,
            RiskLevel::High | RiskLevel::Medium => Recommendation::Review,
            RiskLevel::Low => Recommendation::Approve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 40.0,
            high: 60.0,
            critical: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Review,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewState {
    pub reviewer: Option<String>,
    pub decision: Option<String>,
    pub notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub recommendation: Recommendation,
    pub review: ReviewState,
    pub created_at: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(
        tenant_id: Uuid,
        order_id: Uuid,
        factors: Vec<RiskFactor>,
        thresholds: &RiskLevelThresholds,
    ) -> Self {
        let score: f64 = factors.iter().map(RiskFactor::contribution).sum();
        let level = RiskLevel::from_score(score, thresholds);
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            order_id,
            score,
            recommendation: level.recommendation(),
            level,
            factors,
            review: ReviewState::default(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_sum_of_contributions() {
        let factors = vec![
            RiskFactor::new("blacklist", "email blacklisted", 50.0, 2.0),
            RiskFactor::new("new_customer", "first order", 15.0, 1.0),
        ];
        let assessment = RiskAssessment::new(Uuid::new_v4(), Uuid::new_v4(), factors, &RiskLevelThresholds::default());
        assert_eq!(assessment.score, 115.0);
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert_eq!(assessment.recommendation, Recommendation::Reject);
    }

    #[test]
    fn low_score_maps_to_approve() {
        let factors = vec![RiskFactor::new("new_customer", "first order", 15.0, 1.0)];
        let assessment = RiskAssessment::new(Uuid::new_v4(), Uuid::new_v4(), factors, &RiskLevelThresholds::default());
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.recommendation, Recommendation::Approve);
    }

    #[test]
    fn empty_factors_score_zero() {
        let assessment = RiskAssessment::new(Uuid::new_v4(), Uuid::new_v4(), vec![], &RiskLevelThresholds::default());
        assert_eq!(assessment.score, 0.0);
        assert_eq!(assessment.level, RiskLevel::Low);
    }
}
