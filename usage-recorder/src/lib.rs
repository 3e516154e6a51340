pub mod metric;
pub mod metrics;
pub mod recorder;

pub use metric::UsageMetric;
pub use recorder::{UsageRecorder, UsageRecorderConfig};
