//! The Decision Facade exposed to transports.

use tracing::{info, warn};

use crate::chain::AuthChain;
use crate::error::Result;
use crate::hosts::HostTrustResolver;
use crate::refresh::{RefreshRegistry, RefreshReport};
use crate::resolver::{AuthorizationResolver, ResourceMatches};

/// Composes the authentication chain, the authorization resolver and the
/// host trust resolver behind the decision contract.
///
/// Every collaborator is handed in at construction; swapping a storage
/// provider means building different collaborators, not changing this type.
#[derive(Clone)]
pub struct DecisionService {
    authentication: AuthChain,
    authorization: AuthorizationResolver,
    hosts: HostTrustResolver,
    refresh: RefreshRegistry,
}

impl DecisionService {
    pub fn new(
        authentication: AuthChain,
        authorization: AuthorizationResolver,
        hosts: HostTrustResolver,
        refresh: RefreshRegistry,
    ) -> Self {
        Self {
            authentication,
            authorization,
            hosts,
            refresh,
        }
    }

    pub fn authentication(&self) -> &AuthChain {
        &self.authentication
    }

    pub fn refreshable_count(&self) -> usize {
        self.refresh.len()
    }

    pub async fn authenticate(&self, username: &str, credential: &str) -> Result<bool> {
        self.authentication.authenticate(username, credential).await
    }

    pub async fn is_authorized(&self, user: &str, action: &str, resource: &str) -> Result<bool> {
        let allowed = self
            .authorization
            .is_authorized(user, action, resource)
            .await;

        match &allowed {
            Ok(true) => info!(user, action, resource, "Access ALLOWED"),
            Ok(false) => info!(user, action, resource, "Access DENIED"),
            Err(e) => warn!(user, action, resource, error = %e, "Authorization failed"),
        }

        allowed
    }

    pub async fn matching_resources(
        &self,
        user: &str,
        action: &str,
        pattern: &str,
    ) -> Result<ResourceMatches> {
        self.authorization
            .matching_resources(user, action, pattern)
            .await
    }

    pub async fn is_trusted_host(&self, host: &str) -> Result<bool> {
        let trusted = self.hosts.is_trusted_host(host).await;

        match &trusted {
            Ok(trusted) => info!(host, trusted = *trusted, "Host trust checked"),
            Err(e) => warn!(host, error = %e, "Host trust check failed"),
        }

        trusted
    }

    /// Reloads every refreshable provider. Never fails; partial failures are
    /// listed in the report.
    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh.refresh_all().await
    }
}
