pub mod amount;
pub mod blacklist;
pub mod custom_rules;
pub mod email_pattern;
pub mod geo;
pub mod new_customer;
pub mod velocity;

pub use amount::score_amount_anomaly;
pub use blacklist::score_blacklist;
pub use custom_rules::score_custom_rules;
pub use email_pattern::score_email_pattern;
pub use geo::score_geo;
pub use new_customer::score_new_customer;
pub use velocity::{score_velocity, VelocityCounts, VelocityProbe, VELOCITY_PROBES};
