//! The `warden.yaml` configuration file.
//!
//! ```yaml
//! server:
//!   host: 127.0.0.1
//!   port: 3030
//! logging:
//!   directory: logs
//!   level: info
//! authentication:
//!   - type: htpasswd
//!     path: users.htpasswd
//!   - type: remote
//!     url: https://sso.internal/check
//!     timeout_ms: 2000
//! policy:
//!   type: file
//!   path: policy.yaml
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/warden.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WardenConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Tried in this order
    #[serde(default)]
    pub authentication: Vec<ProviderConfig>,
    pub policy: PolicyConfig,
    /// Host trust rules; the policy store serves them when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<PolicyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

/// One authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Static {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// username -> argon2 PHC hash
        users: BTreeMap<String, String>,
    },
    Htpasswd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        path: PathBuf,
    },
    Sqlite {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        path: PathBuf,
    },
    Remote {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        url: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
}

impl ProviderConfig {
    /// The configured name, or the provider type.
    pub fn name(&self) -> String {
        let (name, kind) = match self {
            ProviderConfig::Static { name, .. } => (name, "static"),
            ProviderConfig::Htpasswd { name, .. } => (name, "htpasswd"),
            ProviderConfig::Sqlite { name, .. } => (name, "sqlite"),
            ProviderConfig::Remote { name, .. } => (name, "remote"),
        };
        name.clone().unwrap_or_else(|| kind.to_string())
    }
}

/// A policy store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PolicyConfig {
    File { path: PathBuf },
    Sqlite { path: PathBuf },
}

impl WardenConfig {
    /// Reads `path`, resolves relative paths and applies environment
    /// overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let mut config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Makes every relative path relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        resolve(&mut self.logging.directory, base);

        for provider in &mut self.authentication {
            match provider {
                ProviderConfig::Htpasswd { path, .. } | ProviderConfig::Sqlite { path, .. } => {
                    resolve(path, base)
                }
                ProviderConfig::Static { .. } | ProviderConfig::Remote { .. } => {}
            }
        }

        for store in std::iter::once(&mut self.policy).chain(self.hosts.as_mut()) {
            match store {
                PolicyConfig::File { path } | PolicyConfig::Sqlite { path } => resolve(path, base),
            }
        }
    }

    /// Applies `WARDEN_HOST` and `WARDEN_PORT`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = var("WARDEN_HOST") {
            if host.is_empty() {
                bail!("WARDEN_HOST must not be empty");
            }
            self.server.host = host;
        }
        if let Some(port) = var("WARDEN_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("WARDEN_PORT is not a port number: {}", port))?;
        }
        Ok(())
    }
}

fn resolve(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
server:
  port: 8080
authentication:
  - type: static
    users:
      alice: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
  - type: htpasswd
    name: local-file
    path: users.htpasswd
  - type: remote
    url: http://127.0.0.1:9000/check
policy:
  type: file
  path: policy.yaml
hosts:
  type: sqlite
  path: /var/lib/warden/hosts.db
"#;

    #[test]
    fn test_parse_and_defaults() {
        let config = WardenConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");

        let names: Vec<String> = config.authentication.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["static", "local-file", "remote"]);
        match &config.authentication[2] {
            ProviderConfig::Remote { timeout_ms, .. } => assert_eq!(*timeout_ms, 5000),
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = WardenConfig::from_yaml(SAMPLE).unwrap();
        config.resolve_paths(Path::new("/etc/warden"));

        assert_eq!(config.logging.directory, PathBuf::from("/etc/warden/logs"));
        match &config.authentication[1] {
            ProviderConfig::Htpasswd { path, .. } => {
                assert_eq!(path, &PathBuf::from("/etc/warden/users.htpasswd"))
            }
            other => panic!("unexpected provider: {:?}", other),
        }
        match &config.policy {
            PolicyConfig::File { path } => {
                assert_eq!(path, &PathBuf::from("/etc/warden/policy.yaml"))
            }
            other => panic!("unexpected policy: {:?}", other),
        }
        // Absolute paths are left alone.
        match &config.hosts {
            Some(PolicyConfig::Sqlite { path }) => {
                assert_eq!(path, &PathBuf::from("/var/lib/warden/hosts.db"))
            }
            other => panic!("unexpected hosts: {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let mut config = WardenConfig::from_yaml(SAMPLE).unwrap();
        let vars = BTreeMap::from([("WARDEN_HOST", "0.0.0.0"), ("WARDEN_PORT", "9999")]);
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9999);

        let err = config
            .apply_overrides(|key| (key == "WARDEN_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("WARDEN_PORT"));
    }

    #[test]
    fn test_rejects_unknown_types_and_missing_policy() {
        assert!(WardenConfig::from_yaml("policy:\n  type: ldap\n  path: x\n").is_err());
        assert!(WardenConfig::from_yaml("server:\n  port: 1\n").is_err());
        assert!(WardenConfig::from_yaml(
            "policy: {type: file, path: p}\nauthentication:\n  - type: kerberos\n"
        )
        .is_err());
    }
}
