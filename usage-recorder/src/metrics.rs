use prometheus::{IntCounter, Registry};

#[derive(Clone)]
pub struct UsageRecorderMetrics {
    pub registry: Registry,
    pub enqueued_total: IntCounter,
    pub dropped_total: IntCounter,
    pub persisted_total: IntCounter,
    pub flush_failures_total: IntCounter,
}

impl UsageRecorderMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let enqueued_total = IntCounter::new(
            "usage_recorder_enqueued_total",
            "UsageMetric values accepted onto the bounded queue",
        )
        .unwrap();
        let dropped_total = IntCounter::new(
            "usage_recorder_dropped_total",
            "UsageMetric values dropped because the bounded queue was full",
        )
        .unwrap();
        let persisted_total = IntCounter::new(
            "usage_recorder_persisted_total",
            "UsageMetric values durably persisted",
        )
        .unwrap();
        let flush_failures_total = IntCounter::new(
            "usage_recorder_flush_failures_total",
            "Batch flush attempts that failed",
        )
        .unwrap();
        let _ = registry.register(Box::new(enqueued_total.clone()));
        let _ = registry.register(Box::new(dropped_total.clone()));
        let _ = registry.register(Box::new(persisted_total.clone()));
        let _ = registry.register(Box::new(flush_failures_total.clone()));
        UsageRecorderMetrics {
            registry,
            enqueued_total,
            dropped_total,
            persisted_total,
            flush_failures_total,
        }
    }
}

impl Default for UsageRecorderMetrics {
    fn default() -> Self {
        Self::new()
    }
}
