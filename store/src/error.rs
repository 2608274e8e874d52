use authz::AuthzError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Policy file parsing error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid policy data: {0}")]
    Invalid(#[from] AuthzError),
}

impl StoreError {
    /// Converts into the decision-contract error, naming the provider.
    pub fn into_authz(self, provider: &str) -> AuthzError {
        match self {
            StoreError::Invalid(AuthzError::Configuration(message)) => {
                AuthzError::Configuration(message)
            }
            other => AuthzError::backend(provider, other),
        }
    }
}
