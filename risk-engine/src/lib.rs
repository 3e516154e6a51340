pub mod assessment;
pub mod blacklist;
pub mod config;
pub mod engine;
pub mod geo;
pub mod handlers;
pub mod metrics;
pub mod order;
pub mod rules;
pub mod signals;
pub mod state;
pub mod store;
pub mod tenant;
pub mod weights;

pub use assessment::{Recommendation, ReviewState, RiskAssessment, RiskFactor, RiskLevel};
pub use blacklist::{BlacklistEntry, BlacklistType};
pub use config::RiskEngineConfig;
pub use engine::RiskEngine;
pub use geo::{GeoInfo, GeoResolver, NoopGeoResolver};
pub use order::OrderData;
pub use rules::{Condition, ConditionValue, FraudRule, Logic, Operator, RuleAction};
pub use state::AppState;
pub use store::RiskStore;
pub use tenant::TrustedTenant;
pub use weights::RiskWeights;
