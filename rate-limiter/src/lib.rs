pub mod config;
pub mod decision;
pub mod engine;
pub mod memory_engine;
pub mod normalize;
pub mod redis_engine;

pub use config::RateLimitConfig;
pub use decision::{RateDecision, RateLimitError};
pub use engine::RateLimiterEngine;
pub use memory_engine::InMemoryRateLimiter;
pub use normalize::normalize_endpoint;
pub use redis_engine::RedisRateLimiter;
