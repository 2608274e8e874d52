//! Host trust: the table of known hosts and the resolver in front of it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::types::require_host;

/// Looks up the trust rule for a host identifier.
///
/// The in-memory table matches identifiers exactly. Richer matching
/// (hostname patterns, network ranges) belongs in another implementation of
/// this trait; the resolver does not change.
#[async_trait]
pub trait HostTrustTable: Send + Sync {
    /// `Some(trusted)` when a rule exists for `host`, `None` otherwise.
    async fn lookup(&self, host: &str) -> Result<Option<bool>>;
}

/// Answers `IsTrustedHost` with default-deny semantics.
#[derive(Clone)]
pub struct HostTrustResolver {
    table: Arc<dyn HostTrustTable>,
}

impl HostTrustResolver {
    pub fn new(table: Arc<dyn HostTrustTable>) -> Self {
        Self { table }
    }

    /// Returns `true` only for hosts explicitly marked trusted.
    pub async fn is_trusted_host(&self, host: &str) -> Result<bool> {
        let host = require_host(host)?;

        let trusted = match self.table.lookup(host).await? {
            Some(trusted) => trusted,
            None => {
                debug!(host, "No trust rule for host, denying");
                false
            }
        };

        Ok(trusted)
    }
}
