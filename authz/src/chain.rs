//! The Authentication Chain.
//!
//! Providers are tried in configuration order until one accepts the
//! credential. A provider that errors (backend down, malformed data) is
//! skipped like a rejection, unless it is the last one in the chain: then the
//! error is returned so an outage at the final backend is visible to the
//! caller instead of looking like a wrong password.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{AuthzError, Result};

/// Verifies a username/credential pair against one backing store.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// A short name for logs and error context.
    fn name(&self) -> &str;

    /// `Ok(true)` accepts, `Ok(false)` rejects, `Err` is a hard failure.
    ///
    /// Implementations must not change shared state on a failed attempt.
    async fn verify(&self, username: &str, credential: &str) -> Result<bool>;
}

/// An ordered, immutable list of authentication providers.
#[derive(Clone, Default)]
pub struct AuthChain {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
}

impl AuthChain {
    pub fn new(providers: Vec<Arc<dyn AuthenticationProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in the order they are tried.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Verifies `username` and `credential` against each provider in turn.
    pub async fn authenticate(&self, username: &str, credential: &str) -> Result<bool> {
        if username.is_empty() {
            return Err(AuthzError::invalid_argument("username must not be empty"));
        }

        let last = self.providers.len().saturating_sub(1);

        for (idx, provider) in self.providers.iter().enumerate() {
            match provider.verify(username, credential).await {
                Ok(true) => {
                    info!(provider = provider.name(), username, "Authentication accepted");
                    return Ok(true);
                }
                Ok(false) => {
                    debug!(provider = provider.name(), username, "Credential rejected");
                }
                Err(e) if idx < last => {
                    warn!(
                        provider = provider.name(),
                        username,
                        error = %e,
                        "Authentication provider failed, trying next"
                    );
                }
                Err(e) => {
                    error!(
                        provider = provider.name(),
                        username,
                        error = %e,
                        "Last authentication provider failed"
                    );
                    return Err(e);
                }
            }
        }

        info!(username, "Authentication denied by every provider");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Outcome {
        Accept,
        Reject,
        Fail,
    }

    struct ScriptedProvider {
        name: String,
        outcome: Outcome,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(name: &str, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthenticationProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn verify(&self, _username: &str, _credential: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Accept => Ok(true),
                Outcome::Reject => Ok(false),
                Outcome::Fail => Err(AuthzError::backend(&self.name, "unreachable")),
            }
        }
    }

    fn chain(providers: &[&Arc<ScriptedProvider>]) -> AuthChain {
        AuthChain::new(
            providers
                .iter()
                .map(|p| Arc::clone(*p) as Arc<dyn AuthenticationProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_falls_through_to_accepting_provider() {
        let p1 = ScriptedProvider::new("p1", Outcome::Reject);
        let p2 = ScriptedProvider::new("p2", Outcome::Accept);

        assert!(chain(&[&p1, &p2]).authenticate("alice", "pw").await.unwrap());
        assert_eq!(p1.calls(), 1);
        assert_eq!(p2.calls(), 1);
    }

    #[tokio::test]
    async fn test_stops_at_first_acceptance() {
        let p1 = ScriptedProvider::new("p1", Outcome::Accept);
        let p2 = ScriptedProvider::new("p2", Outcome::Accept);

        assert!(chain(&[&p1, &p2]).authenticate("alice", "pw").await.unwrap());
        assert_eq!(p2.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_terminal_error_is_a_rejection() {
        let p1 = ScriptedProvider::new("p1", Outcome::Fail);
        let p2 = ScriptedProvider::new("p2", Outcome::Reject);

        let result = chain(&[&p1, &p2]).authenticate("alice", "pw").await;
        assert_eq!(result, Ok(false));
        assert_eq!(p2.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_terminal_error_then_accept() {
        let p1 = ScriptedProvider::new("p1", Outcome::Fail);
        let p2 = ScriptedProvider::new("p2", Outcome::Accept);

        assert!(chain(&[&p1, &p2]).authenticate("alice", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_terminal_error_is_surfaced() {
        let only = ScriptedProvider::new("only", Outcome::Fail);
        let err = chain(&[&only]).authenticate("alice", "pw").await.unwrap_err();
        assert!(err.is_backend_unavailable());

        let p1 = ScriptedProvider::new("p1", Outcome::Reject);
        let p2 = ScriptedProvider::new("p2", Outcome::Fail);
        let err = chain(&[&p1, &p2]).authenticate("alice", "pw").await.unwrap_err();
        assert_eq!(err, AuthzError::backend("p2", "unreachable"));
    }

    #[tokio::test]
    async fn test_all_reject() {
        let p1 = ScriptedProvider::new("p1", Outcome::Reject);
        let p2 = ScriptedProvider::new("p2", Outcome::Reject);
        assert!(!chain(&[&p1, &p2]).authenticate("alice", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_chain_denies() {
        assert!(!AuthChain::default().authenticate("alice", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_username_rejected_before_providers() {
        let p1 = ScriptedProvider::new("p1", Outcome::Accept);
        let err = chain(&[&p1]).authenticate("", "pw").await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(p1.calls(), 0);
    }

    #[test]
    fn test_provider_order_preserved() {
        let a = ScriptedProvider::new("a", Outcome::Reject);
        let b = ScriptedProvider::new("b", Outcome::Reject);
        let c = ScriptedProvider::new("c", Outcome::Reject);
        assert_eq!(chain(&[&a, &b, &c]).provider_names(), vec!["a", "b", "c"]);
    }
}
