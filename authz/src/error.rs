//! Error types for the access-decision core.
//!
//! # Security Note
//! Denials are never errors. An `Ok(false)` is an ordinary decision; the
//! variants below only describe malformed requests and storage problems, so
//! callers can tell "no" apart from "could not decide".

use thiserror::Error;

/// Errors that can occur while answering a decision request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthzError {
    /// The request was malformed: an empty name, a resource not rooted at
    /// `/`, or a pattern that does not compile.
    ///
    /// Always surfaced to the caller and never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A storage or credential backend could not be reached or returned
    /// data that could not be used.
    #[error("Backend unavailable ({provider}): {message}")]
    BackendUnavailable { provider: String, message: String },

    /// One or more refreshable providers failed to reload.
    #[error("Refresh incomplete: {0} provider(s) failed")]
    RefreshPartialFailure(usize),

    /// A provider was configured with values it cannot work with.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthzError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Wraps a backend failure, naming the provider it came from.
    pub fn backend(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            provider: provider.into(),
            message: err.to_string(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

/// A specialized Result type for decision operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
