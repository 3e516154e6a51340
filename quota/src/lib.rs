pub mod decision;
pub mod enforcer;
pub mod resource;

pub use decision::QuotaDecision;
pub use enforcer::QuotaEnforcer;
pub use resource::Resource;
