use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
#[cfg(feature = "kafka-producer")]
use rdkafka::producer::{FutureProducer, FutureRecord};
#[cfg(feature = "kafka-producer")]
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{AuditActor, AuditError, AuditEvent, AuditResult, AuditSeverity, AUDIT_EVENT_VERSION};

/// Destination for audit events. Grounded on `RateLimiterEngine`'s
/// trait-object dispatch (`rate-limiter/src/engine.rs`), generalized to
/// the audit fan-out: a Kafka-backed sink in production, an in-memory
/// sink in tests, a no-op sink when audit export isn't wired up yet.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn publish(&self, event: &AuditEvent) -> AuditResult<()>;
}

pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn publish(&self, _event: &AuditEvent) -> AuditResult<()> {
        Ok(())
    }
}

/// In-memory sink: buffers events instead of publishing them. Used by
/// tests and by the audit consumer's local replay mode.
#[derive(Default)]
pub struct BufferedAuditProducer {
    buffer: Mutex<Vec<AuditEvent>>,
}

impl BufferedAuditProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn drain(&self) -> Vec<AuditEvent> {
        let mut guard = self.buffer.lock().await;
        std::mem::take(&mut *guard)
    }
}

#[async_trait]
impl AuditSink for BufferedAuditProducer {
    async fn publish(&self, event: &AuditEvent) -> AuditResult<()> {
        self.buffer.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(feature = "kafka-producer")]
pub struct KafkaAuditSink {
    producer: FutureProducer,
    topic: String,
}

#[cfg(feature = "kafka-producer")]
impl KafkaAuditSink {
    pub fn new(producer: FutureProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[cfg(feature = "kafka-producer")]
#[async_trait]
impl AuditSink for KafkaAuditSink {
    async fn publish(&self, event: &AuditEvent) -> AuditResult<()> {
        let serialized =
            serde_json::to_vec(event).map_err(|e| AuditError::Serialization(e.to_string()))?;
        let key = event.tenant_id.to_string();
        let record = FutureRecord::to(&self.topic).key(&key).payload(&serialized);
        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| AuditError::Kafka(err.to_string()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuditProducerConfig {
    pub source_service: String,
}

#[derive(Clone)]
pub struct AuditProducer {
    sink: Arc<dyn AuditSink>,
    config: AuditProducerConfig,
}

impl AuditProducer {
    pub fn new(sink: Arc<dyn AuditSink>, config: AuditProducerConfig) -> Self {
        Self { sink, config }
    }

    pub fn noop(source_service: impl Into<String>) -> Self {
        Self::new(
            Arc::new(NoopAuditSink),
            AuditProducerConfig {
                source_service: source_service.into(),
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn emit(
        &self,
        tenant_id: Uuid,
        actor: AuditActor,
        entity_type: impl Into<String>,
        entity_id: Option<Uuid>,
        action: impl Into<String>,
        severity: AuditSeverity,
        trace_id: Option<Uuid>,
        payload: serde_json::Value,
        meta: serde_json::Value,
    ) -> AuditResult<AuditEvent> {
        let event = AuditEvent {
            event_id: Uuid::new_v4(),
            event_version: AUDIT_EVENT_VERSION,
            tenant_id,
            actor,
            entity_type: entity_type.into(),
            entity_id,
            action: action.into(),
            occurred_at: chrono::Utc::now(),
            source_service: self.config.source_service.clone(),
            severity,
            trace_id,
            payload,
            meta,
        };
        self.sink.publish(&event).await?;
        Ok(event)
    }
}

pub fn extract_actor_from_headers(
    headers: &HeaderMap,
    claims_raw: &serde_json::Value,
    subject: Uuid,
) -> AuditActor {
    fn header_str(map: &HeaderMap, name: &str) -> Option<String> {
        map.get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
    let mut actor = AuditActor {
        id: Some(subject),
        name: None,
        email: None,
    };
    actor.name = claims_raw
        .get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    actor.email = claims_raw
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    if let Some(v) = header_str(headers, "X-User-ID").and_then(|s| Uuid::parse_str(&s).ok()) {
        actor.id = Some(v);
    }
    if let Some(v) = header_str(headers, "X-User-Name") {
        actor.name = Some(v);
    }
    if let Some(v) = header_str(headers, "X-User-Email") {
        actor.email = Some(v);
    }
    actor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_sink_emits_successfully() {
        let producer = AuditProducer::noop("risk-engine");
        let event = producer
            .emit(
                Uuid::new_v4(),
                AuditActor::default(),
                "blacklist_entry",
                None,
                "create",
                AuditSeverity::Info,
                None,
                serde_json::json!({}),
                serde_json::json!({}),
            )
            .await
            .unwrap();
        assert_eq!(event.source_service, "risk-engine");
    }

    #[tokio::test]
    async fn buffered_sink_retains_emitted_events() {
        let sink = Arc::new(BufferedAuditProducer::new());
        let producer = AuditProducer::new(
            sink.clone(),
            AuditProducerConfig {
                source_service: "risk-engine".into(),
            },
        );
        producer
            .emit(
                Uuid::new_v4(),
                AuditActor::default(),
                "fraud_rule",
                None,
                "update",
                AuditSeverity::Warning,
                None,
                serde_json::json!({}),
                serde_json::json!({}),
            )
            .await
            .unwrap();
        let drained = sink.drain().await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].action, "update");
    }
}
