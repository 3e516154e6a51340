use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use uuid::Uuid;

/// Stable error envelope: a single `error` string field per the gateway's
/// wire contract, plus optional diagnostic extras carried over requests.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The stable error kinds the gateway and its subsystems surface: 401 credentials, 403 scope, 429 admission/quota (distinguished
/// by `Retry-After` header presence), 402 subscription, plus 400/404/500.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized {
        code: &'static str,
        trace_id: Option<Uuid>,
        message: Option<String>,
    },
    ForbiddenMissingRole {
        role: &'static str,
        trace_id: Option<Uuid>,
    },
    Forbidden {
        trace_id: Option<Uuid>,
    },
    BadRequest {
        code: &'static str,
        trace_id: Option<Uuid>,
        message: Option<String>,
    },
    NotFound {
        code: &'static str,
        trace_id: Option<Uuid>,
    },
    /// Admission (rate limit) or quota exhaustion. `retry_after_secs` is
    /// `Some` for rate-limit denials and `None` for quota denials, so
    /// `Retry-After` is only present when it's meaningful.
    TooManyRequests {
        code: &'static str,
        trace_id: Option<Uuid>,
        retry_after_secs: Option<u64>,
    },
    /// Subscription past-due or suspended.
    PaymentRequired {
        code: &'static str,
        trace_id: Option<Uuid>,
        message: Option<String>,
    },
    Internal {
        trace_id: Option<Uuid>,
        message: Option<String>,
    },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self {
        Self::Internal {
            trace_id,
            message: Some(e.to_string()),
        }
    }

    pub fn bad_request(code: &'static str, trace_id: Option<Uuid>) -> Self {
        Self::BadRequest {
            code,
            trace_id,
            message: None,
        }
    }

    pub fn unauthorized(code: &'static str, trace_id: Option<Uuid>) -> Self {
        Self::Unauthorized {
            code,
            trace_id,
            message: None,
        }
    }

    pub fn rate_limited(trace_id: Option<Uuid>, retry_after_secs: u64) -> Self {
        Self::TooManyRequests {
            code: "rate_limit_exceeded",
            trace_id,
            retry_after_secs: Some(retry_after_secs),
        }
    }

    pub fn quota_exceeded(code: &'static str, trace_id: Option<Uuid>) -> Self {
        Self::TooManyRequests {
            code,
            trace_id,
            retry_after_secs: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code, retry_after) = match self {
            ApiError::Unauthorized {
                code,
                trace_id,
                message,
            } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: code.into(),
                    missing_role: None,
                    trace_id,
                    message,
                },
                code,
                None,
            ),
            ApiError::ForbiddenMissingRole { role, trace_id } => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "missing_role".into(),
                    missing_role: Some(role.into()),
                    trace_id,
                    message: None,
                },
                "missing_role",
                None,
            ),
            ApiError::Forbidden { trace_id } => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "forbidden".into(),
                    missing_role: None,
                    trace_id,
                    message: None,
                },
                "forbidden",
                None,
            ),
            ApiError::BadRequest {
                code,
                trace_id,
                message,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: code.into(),
                    missing_role: None,
                    trace_id,
                    message,
                },
                code,
                None,
            ),
            ApiError::NotFound { code, trace_id } => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: code.into(),
                    missing_role: None,
                    trace_id,
                    message: None,
                },
                code,
                None,
            ),
            ApiError::TooManyRequests {
                code,
                trace_id,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    error: code.into(),
                    missing_role: None,
                    trace_id,
                    message: None,
                },
                code,
                retry_after_secs,
            ),
            ApiError::PaymentRequired {
                code,
                trace_id,
                message,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                ErrorBody {
                    error: code.into(),
                    missing_role: None,
                    trace_id,
                    message,
                },
                code,
                None,
            ),
            ApiError::Internal { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "internal_error".into(),
                    missing_role: None,
                    trace_id,
                    message,
                },
                "internal_error",
                None,
            ),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        if let Some(secs) = retry_after {
            if let Ok(val) = HeaderValue::from_str(&secs.to_string()) {
                resp.headers_mut().insert("Retry-After", val);
            }
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ---------------- Error-code cardinality guard ----------------
//
// Per-service error codes become a Prometheus label. Unbounded label
// cardinality (e.g. a handler that echoes attacker-controlled strings as
// error codes) can take down the metrics pipeline, so codes beyond
// MAX_ERROR_CODES collapse onto a single "overflow" label.

const MAX_ERROR_CODES: usize = 40;

static HTTP_ERROR_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new(
            "http_errors_total",
            "Count of HTTP error responses emitted (status >= 400)",
        ),
        &["service", "code", "status"],
    )
    .unwrap();
    HTTP_ERROR_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static DISTINCT_ERROR_CODES: Lazy<IntGauge> = Lazy::new(|| {
    let v = IntGauge::new(
        "http_error_code_cardinality",
        "Distinct error codes observed, capped at the cardinality guard",
    )
    .unwrap();
    HTTP_ERROR_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static ERROR_CODE_OVERFLOW_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let v = IntCounter::new(
        "http_error_code_cardinality_overflow_total",
        "Error responses whose code was collapsed into the overflow label",
    )
    .unwrap();
    HTTP_ERROR_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static SEEN_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn record_error(service: &str, code: &str, status: u16) {
    let label = {
        let mut seen = SEEN_CODES.lock().expect("error-code guard mutex poisoned");
        if seen.contains(code) {
            code.to_string()
        } else if seen.len() < MAX_ERROR_CODES {
            seen.insert(code.to_string());
            DISTINCT_ERROR_CODES.set(seen.len() as i64);
            code.to_string()
        } else {
            ERROR_CODE_OVERFLOW_TOTAL.inc();
            "overflow".to_string()
        }
    };
    HTTP_ERRORS_TOTAL
        .with_label_values(&[service, &label, &status.to_string()])
        .inc();
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Axum middleware that counts error responses, labeled by service and
/// error code, guarding against unbounded label cardinality.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request<Body>, Next) -> MiddlewareFuture + Clone {
    move |req: Request<Body>, next: Next| {
        Box::pin(async move {
            let resp = next.run(req).await;
            let status = resp.status();
            if status.as_u16() >= 400 {
                let code = resp
                    .headers()
                    .get("X-Error-Code")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown")
                    .to_string();
                record_error(service, &code, status.as_u16());
            }
            resp
        })
    }
}

/// Test-only hooks exercising the cardinality guard without building a
/// full router.
pub mod test_helpers {
    use super::*;

    pub fn simulate_error_code(code: &str) {
        record_error("test", code, 599);
    }

    pub fn distinct_gauge() -> i64 {
        DISTINCT_ERROR_CODES.get()
    }

    pub fn overflow_count() -> i64 {
        ERROR_CODE_OVERFLOW_TOTAL.get()
    }
}
