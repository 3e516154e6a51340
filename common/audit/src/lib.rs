pub mod model;
pub mod producer;

pub use model::{AuditEvent, AuditActor, AuditError, AuditResult, AUDIT_EVENT_VERSION, AuditSeverity};
pub use producer::{AuditProducer, AuditProducerConfig, BufferedAuditProducer, extract_actor_from_headers, NoopAuditSink};
pub use producer::AuditSink;
#[cfg(feature = "kafka-producer")] pub use producer::KafkaAuditSink;
