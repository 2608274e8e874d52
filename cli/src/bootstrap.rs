//! Builds the decision service from configuration.

use anyhow::{bail, Context, Result};
use authn::{HtpasswdProvider, RemoteProvider, SqliteCredentialProvider, StaticProvider};
use authz::{
    AuthChain, AuthenticationProvider, AuthorizationResolver, DecisionService, EventBus,
    HostTrustResolver, MemoryPolicy, RefreshRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use store::{FilePolicyStore, SqlitePolicyStore};
use tracing::info;

use crate::config::{PolicyConfig, ProviderConfig, WardenConfig};

pub struct Bootstrap {
    pub service: DecisionService,
    pub events: EventBus,
}

/// Opens every configured provider in configuration order.
///
/// Refreshable providers are registered in the same order: credential
/// stores first, then the policy store, then a separate host store.
pub async fn build(config: &WardenConfig) -> Result<Bootstrap> {
    let events = EventBus::default();
    let mut refresh = RefreshRegistry::new();

    let mut providers: Vec<Arc<dyn AuthenticationProvider>> = Vec::new();
    for descriptor in &config.authentication {
        providers.push(open_provider(descriptor, &mut refresh).await?);
    }
    let authentication = AuthChain::new(providers);

    let policy = open_policy("policy", &config.policy, &events, &mut refresh).await?;
    let hosts = match &config.hosts {
        Some(descriptor) => open_policy("hosts", descriptor, &events, &mut refresh).await?,
        None => policy.clone(),
    };

    info!(
        authentication = ?authentication.provider_names(),
        refreshable = refresh.len(),
        "Providers initialized"
    );

    let service = DecisionService::new(
        authentication,
        AuthorizationResolver::new(policy.clone(), policy.clone()).with_catalog(policy),
        HostTrustResolver::new(hosts),
        refresh,
    );

    Ok(Bootstrap { service, events })
}

async fn open_provider(
    descriptor: &ProviderConfig,
    refresh: &mut RefreshRegistry,
) -> Result<Arc<dyn AuthenticationProvider>> {
    let name = descriptor.name();

    let provider: Arc<dyn AuthenticationProvider> = match descriptor {
        ProviderConfig::Static { users, .. } => Arc::new(StaticProvider::new(
            name,
            users.clone().into_iter().collect(),
        )),
        ProviderConfig::Htpasswd { path, .. } => {
            let provider = Arc::new(
                HtpasswdProvider::open(name.clone(), path)
                    .await
                    .with_context(|| format!("Failed to open credentials file for {}", name))?,
            );
            refresh.register(provider.clone());
            provider
        }
        ProviderConfig::Sqlite { path, .. } => Arc::new(
            SqliteCredentialProvider::connect(name.clone(), path)
                .await
                .with_context(|| format!("Failed to open credential database for {}", name))?,
        ),
        ProviderConfig::Remote {
            url, timeout_ms, ..
        } => Arc::new(
            RemoteProvider::new(name.clone(), url.clone(), Duration::from_millis(*timeout_ms))
                .with_context(|| format!("Failed to configure remote provider {}", name))?,
        ),
    };

    Ok(provider)
}

async fn open_policy(
    name: &str,
    descriptor: &PolicyConfig,
    events: &EventBus,
    refresh: &mut RefreshRegistry,
) -> Result<Arc<MemoryPolicy>> {
    match descriptor {
        PolicyConfig::File { path } => {
            let store = Arc::new(
                FilePolicyStore::open(name, path.clone(), events.clone())
                    .await
                    .with_context(|| format!("Failed to load {} file {}", name, path.display()))?,
            );
            refresh.register(store.clone());
            Ok(store.policy())
        }
        PolicyConfig::Sqlite { path } => {
            let store = Arc::new(
                SqlitePolicyStore::connect(name, path, events.clone())
                    .await
                    .with_context(|| {
                        format!("Failed to open {} database {}", name, path.display())
                    })?,
            );
            refresh.register(store.clone());
            Ok(store.policy())
        }
    }
}

/// Opens the SQLite credential store named `provider`, or the only one
/// configured when no name is given.
pub async fn open_credential_store(
    config: &WardenConfig,
    provider: Option<&str>,
) -> Result<SqliteCredentialProvider> {
    let candidates: Vec<(String, &PathBuf)> = config
        .authentication
        .iter()
        .filter_map(|descriptor| match descriptor {
            ProviderConfig::Sqlite { path, .. } => Some((descriptor.name(), path)),
            _ => None,
        })
        .collect();

    let (name, path) = match provider {
        Some(wanted) => match candidates.into_iter().find(|(name, _)| name == wanted) {
            Some(found) => found,
            None => bail!("No sqlite authentication provider named '{}'", wanted),
        },
        None => {
            let mut candidates = candidates.into_iter();
            match (candidates.next(), candidates.next()) {
                (Some(only), None) => only,
                (None, _) => bail!("No sqlite authentication provider is configured"),
                _ => bail!("Several sqlite providers are configured; pass --provider"),
            }
        }
    };

    SqliteCredentialProvider::connect(name.clone(), path)
        .await
        .with_context(|| format!("Failed to open credential database for {}", name))
}

/// Opens the SQLite policy database that serves `target`.
///
/// Host rules go to the `hosts` store when one is configured.
pub async fn open_policy_database(
    config: &WardenConfig,
    target: PolicyTarget,
) -> Result<SqlitePolicyStore> {
    let (name, descriptor) = match (target, &config.hosts) {
        (PolicyTarget::Hosts, Some(hosts)) => ("hosts", hosts),
        _ => ("policy", &config.policy),
    };

    match descriptor {
        PolicyConfig::Sqlite { path } => {
            SqlitePolicyStore::connect(name, path, EventBus::default())
                .await
                .with_context(|| format!("Failed to open {} database {}", name, path.display()))
        }
        PolicyConfig::File { path } => bail!(
            "The {} store is the file {}; edit it directly and refresh",
            name,
            path.display()
        ),
    }
}

/// Which policy store a write is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyTarget {
    Principals,
    Hosts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config(dir: &Path, authentication: &str) -> WardenConfig {
        let yaml = format!(
            "authentication:\n{}\npolicy:\n  type: file\n  path: policy.yaml\n",
            authentication
        );
        let mut config = WardenConfig::from_yaml(&yaml).unwrap();
        config.resolve_paths(dir);
        config
    }

    #[tokio::test]
    async fn test_build_registers_refreshables_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let hash = authn::hash_password("pw").unwrap();
        std::fs::write(dir.path().join("users.htpasswd"), format!("alice:{}\n", hash)).unwrap();
        std::fs::write(
            dir.path().join("policy.yaml"),
            "grants:\n  - {action: read, resource: /, principals: [alice]}\n",
        )
        .unwrap();

        let config = config(
            dir.path(),
            "  - type: htpasswd\n    path: users.htpasswd\n  - type: sqlite\n    path: creds.db",
        );
        let bootstrap = build(&config).await.unwrap();
        let service = bootstrap.service;

        assert_eq!(
            service.authentication().provider_names(),
            vec!["htpasswd", "sqlite"]
        );
        assert_eq!(service.refreshable_count(), 2);
        assert!(service.authenticate("alice", "pw").await.unwrap());
        assert!(service.is_authorized("alice", "read", "/x").await.unwrap());

        let report = service.refresh_all().await;
        assert_eq!(report.refreshed, vec!["htpasswd", "policy"]);
    }

    #[tokio::test]
    async fn test_missing_policy_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "  []");
        let err = build(&config).await.err().unwrap();
        assert!(format!("{:#}", err).contains("policy"));
    }

    #[tokio::test]
    async fn test_open_credential_store_picks_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            dir.path(),
            "  - type: sqlite\n    name: staff\n    path: staff.db\n  - type: sqlite\n    name: bots\n    path: bots.db",
        );

        assert!(open_credential_store(&config, None).await.is_err());
        let store = open_credential_store(&config, Some("bots")).await.unwrap();
        store.set_password("ci", "token").await.unwrap();
        assert!(dir.path().join("bots.db").exists());
        assert!(open_credential_store(&config, Some("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_open_policy_database_requires_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let file_backed = config(dir.path(), "  []");
        let err = open_policy_database(&file_backed, PolicyTarget::Principals)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("policy.yaml"));

        let yaml = "policy:\n  type: sqlite\n  path: policy.db\nhosts:\n  type: sqlite\n  path: hosts.db\n";
        let mut split = WardenConfig::from_yaml(yaml).unwrap();
        split.resolve_paths(dir.path());

        let hosts = open_policy_database(&split, PolicyTarget::Hosts).await.unwrap();
        hosts.set_host("10.0.0.1", true).await.unwrap();
        assert!(dir.path().join("hosts.db").exists());
        assert!(open_policy_database(&split, PolicyTarget::Principals)
            .await
            .is_ok());
        assert!(dir.path().join("policy.db").exists());
    }
}
