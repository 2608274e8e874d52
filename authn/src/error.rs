use authz::AuthzError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthnError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid password hash: {0}")]
    PasswordHash(String),

    #[error("Invalid credentials file {path} line {line}: {message}")]
    Format {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Unexpected response from upstream: {0}")]
    UpstreamStatus(u16),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthnError {
    /// Converts into the decision-contract error, naming the provider.
    pub fn into_authz(self, provider: &str) -> AuthzError {
        match self {
            AuthnError::Configuration(message) => AuthzError::Configuration(message),
            other => AuthzError::backend(provider, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_authz() {
        let err = AuthnError::UpstreamStatus(502).into_authz("remote");
        assert_eq!(
            err,
            AuthzError::backend("remote", "Unexpected response from upstream: 502")
        );

        let err = AuthnError::Configuration("missing url".into()).into_authz("remote");
        assert_eq!(err, AuthzError::Configuration("missing url".into()));
    }
}
