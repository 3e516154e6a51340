use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("api key not found")]
    NotFound,
    #[error("api key is inactive")]
    Inactive,
    #[error("api key has expired")]
    Expired,
    #[error("tenant is not admittable")]
    TenantNotAdmittable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type CredentialResult<T> = Result<T, CredentialError>;
