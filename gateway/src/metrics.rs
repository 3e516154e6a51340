use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Same registry-per-crate shape used throughout this codebase,
/// generalized from RPM-target/channel-depth gauges (no longer
/// applicable; usage recording owns its own queue metrics) to
/// per-step admission counters.
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    admission_checks: IntCounterVec,
    admission_denials: IntCounterVec,
    rate_limiter_latency: Histogram,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let admission_checks = IntCounterVec::new(
            Opts::new("gateway_admission_checks_total", "Total admission middleware passes"),
            &["stage"],
        )?;
        let admission_denials = IntCounterVec::new(
            Opts::new("gateway_admission_denials_total", "Admission denials by stage"),
            &["stage"],
        )?;
        let rate_limiter_latency = Histogram::with_opts(HistogramOpts::new(
            "gateway_rate_limiter_decision_seconds",
            "Time spent performing the rate limiter admission check",
        ))?;
        registry.register(Box::new(admission_checks.clone()))?;
        registry.register(Box::new(admission_denials.clone()))?;
        registry.register(Box::new(rate_limiter_latency.clone()))?;
        Ok(Self {
            registry,
            admission_checks,
            admission_denials,
            rate_limiter_latency,
        })
    }

    pub fn record_pass(&self, stage: &str) {
        self.admission_checks.with_label_values(&[stage]).inc();
    }

    pub fn record_denial(&self, stage: &str) {
        self.admission_denials.with_label_values(&[stage]).inc();
    }

    pub fn observe_rate_limiter_latency(&self, secs: f64) {
        self.rate_limiter_latency.observe(secs);
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
