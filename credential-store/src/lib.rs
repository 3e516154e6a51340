pub mod cache;
pub mod error;
pub mod model;
pub mod store;

pub use error::CredentialError;
pub use model::{ApiKey, ApiKeySummary, NewApiKey};
pub use store::CredentialStore;
