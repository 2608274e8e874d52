//! Flat-file credentials in `username:hash` lines.
//!
//! ```text
//! # comment
//! alice:$argon2id$v=19$m=19456,t=2,p=1$...
//! ```
//!
//! The file is read once on open and again on every refresh. A reload that
//! fails leaves the previous entries in service.

use async_trait::async_trait;
use authz::{AuthenticationProvider, Refreshable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{AuthnError, Result};
use crate::password::verify_password_blocking;

/// Credentials loaded from an htpasswd-style file.
pub struct HtpasswdProvider {
    name: String,
    path: PathBuf,
    entries: RwLock<Arc<HashMap<String, String>>>,
    /// Held across load and swap so reloads install in order.
    reload: Mutex<()>,
}

impl HtpasswdProvider {
    /// Opens and parses `path`.
    pub async fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load(&path).await?;
        let name = name.into();

        info!(
            provider = %name,
            path = %path.display(),
            users = entries.len(),
            "Credentials file loaded"
        );

        Ok(Self {
            name,
            path,
            entries: RwLock::new(Arc::new(entries)),
            reload: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn user_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

async fn load(path: &Path) -> Result<HashMap<String, String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse(path, &contents)
}

fn parse(path: &Path, contents: &str) -> Result<HashMap<String, String>> {
    let mut entries = HashMap::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let format_error = |message: &str| AuthnError::Format {
            path: path.display().to_string(),
            line: idx + 1,
            message: message.to_string(),
        };

        let (username, hash) = line
            .split_once(':')
            .ok_or_else(|| format_error("expected `username:hash`"))?;
        if username.is_empty() {
            return Err(format_error("empty username"));
        }
        if hash.is_empty() {
            return Err(format_error("empty hash"));
        }
        if entries
            .insert(username.to_string(), hash.to_string())
            .is_some()
        {
            return Err(format_error("duplicate username"));
        }
    }

    Ok(entries)
}

#[async_trait]
impl AuthenticationProvider for HtpasswdProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn verify(&self, username: &str, credential: &str) -> authz::Result<bool> {
        let entries = self.entries.read().await.clone();

        let Some(hash) = entries.get(username) else {
            debug!(provider = %self.name, username, "Unknown user");
            return Ok(false);
        };

        verify_password_blocking(hash.clone(), credential.to_string())
            .await
            .map_err(|e| e.into_authz(&self.name))
    }
}

#[async_trait]
impl Refreshable for HtpasswdProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn refresh(&self) -> authz::Result<()> {
        let _reload = self.reload.lock().await;
        let entries = load(&self.path)
            .await
            .map_err(|e| e.into_authz(&self.name))?;
        let count = entries.len();

        *self.entries.write().await = Arc::new(entries);

        info!(provider = %self.name, users = count, "Credentials file reloaded");
        Ok(())
    }
}
