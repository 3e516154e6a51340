pub mod config;
pub mod context;
pub mod metrics;
pub mod middleware;
pub mod proxy;
pub mod state;

pub use config::GatewayConfig;
pub use context::{require_scope, GatewayContext, GatewayCtxExtractor};
pub use metrics::GatewayMetrics;
pub use middleware::admission_middleware;
pub use proxy::proxy_downstream;
pub use state::AppState;
