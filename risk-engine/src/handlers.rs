use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use common_audit::{extract_actor_from_headers, AuditSeverity};
use common_http_errors::{ApiError, ApiResult};
use common_money::normalize_scale;
use serde::Deserialize;
use uuid::Uuid;

use crate::assessment::{RiskAssessment, RiskLevel};
use crate::blacklist::{BlacklistEntry, BlacklistType};
use crate::order::OrderData;
use crate::rules::{Condition, FraudRule, RuleAction};
use crate::state::AppState;
use crate::tenant::TrustedTenant;

fn actor_from(headers: &HeaderMap) -> common_audit::AuditActor {
    extract_actor_from_headers(headers, &serde_json::Value::Null, Uuid::nil())
}

/// `POST /assess`: scores an order for the
/// caller's tenant. The tenant in the body is overwritten by the
/// trusted header — never trust a client-supplied tenant id.
pub async fn assess(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    Json(mut order): Json<OrderData>,
) -> ApiResult<Json<RiskAssessment>> {
    order.tenant_id = tenant_id;
    order.amount = normalize_scale(&order.amount);

    let assessment = state.engine.assess(&order).await.map_err(|err| ApiError::internal(err, None))?;
    state.metrics.assessments_total.inc();
    if assessment.recommendation == crate::assessment::Recommendation::Reject {
        state.metrics.assessments_rejected_total.inc();
    }
    Ok(Json(assessment))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub reviewer: String,
    pub decision: String,
    pub notes: Option<String>,
}

/// `POST /review/{order_id}`: sets reviewer/decision/notes without
/// re-running the engine.
pub async fn review(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    Path(order_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<RiskAssessment>> {
    let updated = state
        .engine
        .review(tenant_id, order_id, &req.reviewer, &req.decision, req.notes.as_deref())
        .await
        .map_err(|err| ApiError::internal(err, None))?
        .ok_or_else(|| ApiError::NotFound {
            code: "assessment_not_found",
            trace_id: None,
        })?;

    if let Err(err) = state
        .audit
        .emit(
            tenant_id,
            actor_from(&headers),
            "fraud_assessment",
            Some(updated.id),
            "review",
            AuditSeverity::Info,
            None,
            serde_json::json!({"decision": req.decision, "reviewer": req.reviewer}),
            serde_json::json!({}),
        )
        .await
    {
        tracing::warn!(?err, "failed to emit audit event");
    }

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ListAssessmentsQuery {
    pub risk_level: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// `GET /assessments?risk_level=&from=&to=`: server-side filtered,
/// always scoped to the trusted tenant.
pub async fn list_assessments(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    Query(query): Query<ListAssessmentsQuery>,
) -> ApiResult<Json<Vec<RiskAssessment>>> {
    let risk_level = query.risk_level.as_deref().and_then(parse_risk_level);
    let assessments = state
        .store
        .list_assessments(tenant_id, risk_level, query.from, query.to)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(assessments))
}

fn parse_risk_level(value: &str) -> Option<RiskLevel> {
    match value {
        "low" => Some(RiskLevel::Low),
        "medium" => Some(RiskLevel::Medium),
        "high" => Some(RiskLevel::High),
        "critical" => Some(RiskLevel::Critical),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct BlacklistEntryRequest {
    pub entry_type: String,
    pub value: String,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Blacklist/rule CRUD is scoped to the authenticated tenant server-side.
pub async fn list_blacklist(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
) -> ApiResult<Json<Vec<BlacklistEntry>>> {
    let entries = state.store.list_blacklist(tenant_id).await.map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(entries))
}

pub async fn create_blacklist_entry(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    headers: HeaderMap,
    Json(req): Json<BlacklistEntryRequest>,
) -> ApiResult<Json<BlacklistEntry>> {
    let entry_type = BlacklistType::parse(&req.entry_type).ok_or_else(|| ApiError::bad_request("invalid_entry_type", None))?;
    let entry = state
        .store
        .create_blacklist_entry(tenant_id, entry_type, &req.value, req.reason.as_deref(), req.expires_at)
        .await
        .map_err(|err| ApiError::internal(err, None))?;

    if let Err(err) = state
        .audit
        .emit(
            tenant_id,
            actor_from(&headers),
            "blacklist_entry",
            Some(entry.id),
            "create",
            AuditSeverity::Warning,
            None,
            serde_json::json!({"entry_type": req.entry_type, "value": req.value}),
            serde_json::json!({}),
        )
        .await
    {
        tracing::warn!(?err, "failed to emit audit event");
    }

    Ok(Json(entry))
}

pub async fn delete_blacklist_entry(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<()> {
    let deleted = state.store.delete_blacklist_entry(tenant_id, id).await.map_err(|err| ApiError::internal(err, None))?;
    if !deleted {
        return Err(ApiError::NotFound {
            code: "blacklist_entry_not_found",
            trace_id: None,
        });
    }

    if let Err(err) = state
        .audit
        .emit(
            tenant_id,
            actor_from(&headers),
            "blacklist_entry",
            Some(id),
            "delete",
            AuditSeverity::Warning,
            None,
            serde_json::json!({}),
            serde_json::json!({}),
        )
        .await
    {
        tracing::warn!(?err, "failed to emit audit event");
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub action: RuleActionWire,
    pub added_score: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleActionWire {
    Flag,
    Block,
    Review,
}

impl From<RuleActionWire> for RuleAction {
    fn from(value: RuleActionWire) -> Self {
        match value {
            RuleActionWire::Flag => RuleAction::Flag,
            RuleActionWire::Block => RuleAction::Block,
            RuleActionWire::Review => RuleAction::Review,
        }
    }
}

pub async fn list_rules(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
) -> ApiResult<Json<Vec<FraudRule>>> {
    let rules = state.store.list_rules(tenant_id).await.map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(rules))
}

pub async fn create_rule(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    headers: HeaderMap,
    Json(req): Json<RuleRequest>,
) -> ApiResult<Json<FraudRule>> {
    let rule = state
        .store
        .create_rule(tenant_id, &req.name, &req.conditions, req.action.into(), req.added_score, req.active, req.priority)
        .await
        .map_err(|err| ApiError::internal(err, None))?;

    if let Err(err) = state
        .audit
        .emit(
            tenant_id,
            actor_from(&headers),
            "fraud_rule",
            Some(rule.id),
            "create",
            AuditSeverity::Info,
            None,
            serde_json::json!({"name": rule.name}),
            serde_json::json!({}),
        )
        .await
    {
        tracing::warn!(?err, "failed to emit audit event");
    }

    Ok(Json(rule))
}

pub async fn update_rule(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<RuleRequest>,
) -> ApiResult<Json<FraudRule>> {
    let rule = state
        .store
        .update_rule(tenant_id, id, &req.name, &req.conditions, req.action.into(), req.added_score, req.active, req.priority)
        .await
        .map_err(|err| ApiError::internal(err, None))?
        .ok_or_else(|| ApiError::NotFound {
            code: "rule_not_found",
            trace_id: None,
        })?;

    if let Err(err) = state
        .audit
        .emit(
            tenant_id,
            actor_from(&headers),
            "fraud_rule",
            Some(rule.id),
            "update",
            AuditSeverity::Info,
            None,
            serde_json::json!({"name": rule.name}),
            serde_json::json!({}),
        )
        .await
    {
        tracing::warn!(?err, "failed to emit audit event");
    }

    Ok(Json(rule))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    TrustedTenant(tenant_id): TrustedTenant,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<()> {
    let deleted = state.store.delete_rule(tenant_id, id).await.map_err(|err| ApiError::internal(err, None))?;
    if !deleted {
        return Err(ApiError::NotFound {
            code: "rule_not_found",
            trace_id: None,
        });
    }

    if let Err(err) = state
        .audit
        .emit(
            tenant_id,
            actor_from(&headers),
            "fraud_rule",
            Some(id),
            "delete",
            AuditSeverity::Warning,
            None,
            serde_json::json!({}),
            serde_json::json!({}),
        )
        .await
    {
        tracing::warn!(?err, "failed to emit audit event");
    }

    Ok(())
}
