use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct RiskEngineMetrics {
    pub registry: Registry,
    pub assessments_total: IntCounter,
    pub assessments_rejected_total: IntCounter,
    pub signal_failures_total: IntCounter,
}

impl RiskEngineMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let assessments_total = IntCounter::new(
            "risk_engine_assessments_total",
            "Completed risk assessments",
        )
        .unwrap();
        let assessments_rejected_total = IntCounter::new(
            "risk_engine_assessments_rejected_total",
            "Assessments recommending rejection",
        )
        .unwrap();
        let signal_failures_total = IntCounter::new(
            "risk_engine_signal_failures_total",
            "Individual signal lookups that degraded silently",
        )
        .unwrap();
        let _ = registry.register(Box::new(assessments_total.clone()));
        let _ = registry.register(Box::new(assessments_rejected_total.clone()));
        let _ = registry.register(Box::new(signal_failures_total.clone()));
        RiskEngineMetrics {
            registry,
            assessments_total,
            assessments_rejected_total,
            signal_failures_total,
        }
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"))
            .body(Body::from(buffer))?;
        Ok(response)
    }
}

impl Default for RiskEngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
