//! Policy served from a YAML file.

use async_trait::async_trait;
use authz::{EventBus, MemoryPolicy, PolicySnapshot, Refreshable};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::document::PolicyDocument;
use crate::error::Result;

/// Loads a [`PolicyDocument`] into a shared [`MemoryPolicy`] and reloads it
/// on refresh.
pub struct FilePolicyStore {
    name: String,
    path: PathBuf,
    policy: Arc<MemoryPolicy>,
    /// Held across load and replace so reloads install in order.
    reload: Mutex<()>,
}

impl FilePolicyStore {
    /// Reads `path`; a missing or invalid file fails the open.
    pub async fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        events: EventBus,
    ) -> Result<Self> {
        let name = name.into();
        let path = path.into();
        let snapshot = load(&path).await?;

        info!(
            provider = %name,
            path = %path.display(),
            users = snapshot.users().len(),
            grants = snapshot.grant_count(),
            hosts = snapshot.host_count(),
            "Policy file loaded"
        );

        Ok(Self {
            name,
            path,
            policy: Arc::new(MemoryPolicy::with_events(snapshot, events)),
            reload: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The policy this store keeps current.
    pub fn policy(&self) -> Arc<MemoryPolicy> {
        self.policy.clone()
    }
}

async fn load(path: &Path) -> Result<PolicySnapshot> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(PolicyDocument::from_yaml(&contents)?.to_snapshot())
}

#[async_trait]
impl Refreshable for FilePolicyStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn refresh(&self) -> authz::Result<()> {
        let _reload = self.reload.lock().await;
        let snapshot = load(&self.path)
            .await
            .map_err(|e| e.into_authz(&self.name))?;
        self.policy.replace(snapshot).await;
        Ok(())
    }
}
