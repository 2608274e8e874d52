//! In-memory policy snapshot shared by every storage provider.
//!
//! Providers load their backing store into a [`PolicySnapshot`] and hand it
//! to a [`MemoryPolicy`], which serves the directory, grant, catalog and
//! host-trust traits. Reloading builds a whole new snapshot and swaps it in
//! under the write lock, so a reader sees either the old tables or the new
//! ones, never a mix.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::directory::PrincipalDirectory;
use crate::error::Result;
use crate::events::{EventBus, PrincipalsChanged};
use crate::grants::{GrantTable, ResourceCatalog};
use crate::hosts::HostTrustTable;
use crate::types::{Action, ResourcePath};

/// An immutable copy of users, groups, grants, host rules and known
/// resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    users: BTreeSet<String>,
    groups: BTreeMap<String, BTreeSet<String>>,
    /// action -> resource-prefix -> principal names
    grants: HashMap<String, HashMap<String, BTreeSet<String>>>,
    hosts: HashMap<String, bool>,
    resources: BTreeSet<ResourcePath>,
    /// user -> groups, derived from `groups`
    memberships: HashMap<String, BTreeSet<String>>,
}

impl PolicySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.add_user(user);
        self
    }

    /// Adds a group with the given members. Members become known users.
    pub fn with_group<I, S>(mut self, group: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = group.into();
        self.add_group(group.clone());
        for member in members {
            self.add_group_member(group.clone(), member);
        }
        self
    }

    pub fn with_grant(
        mut self,
        action: Action,
        prefix: ResourcePath,
        principal: impl Into<String>,
    ) -> Self {
        self.add_grant(&action, &prefix, principal);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, trusted: bool) -> Self {
        self.set_host(host, trusted);
        self
    }

    pub fn with_resource(mut self, resource: ResourcePath) -> Self {
        self.add_resource(resource);
        self
    }

    pub fn add_user(&mut self, user: impl Into<String>) {
        self.users.insert(user.into());
    }

    pub fn add_group(&mut self, group: impl Into<String>) {
        self.groups.entry(group.into()).or_default();
    }

    pub fn add_group_member(&mut self, group: impl Into<String>, user: impl Into<String>) {
        let group = group.into();
        let user = user.into();
        self.users.insert(user.clone());
        self.groups
            .entry(group.clone())
            .or_default()
            .insert(user.clone());
        self.memberships.entry(user).or_default().insert(group);
    }

    pub fn add_grant(
        &mut self,
        action: &Action,
        prefix: &ResourcePath,
        principal: impl Into<String>,
    ) {
        self.grants
            .entry(action.as_str().to_string())
            .or_default()
            .entry(prefix.as_str().to_string())
            .or_default()
            .insert(principal.into());
    }

    pub fn set_host(&mut self, host: impl Into<String>, trusted: bool) {
        self.hosts.insert(host.into(), trusted);
    }

    pub fn add_resource(&mut self, resource: ResourcePath) {
        self.resources.insert(resource);
    }

    pub fn users(&self) -> &BTreeSet<String> {
        &self.users
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.groups
    }

    pub fn grant_count(&self) -> usize {
        self.grants
            .values()
            .flat_map(|by_prefix| by_prefix.values())
            .map(BTreeSet::len)
            .sum()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    fn groups_of(&self, user: &str) -> BTreeSet<String> {
        self.memberships.get(user).cloned().unwrap_or_default()
    }

    fn principals_for(&self, action: &str, prefix: &str) -> BTreeSet<String> {
        self.grants
            .get(action)
            .and_then(|by_prefix| by_prefix.get(prefix))
            .cloned()
            .unwrap_or_default()
    }

    fn grant_resources(&self) -> BTreeSet<ResourcePath> {
        self.grants
            .values()
            .flat_map(|by_prefix| by_prefix.keys())
            .filter_map(|prefix| ResourcePath::parse(prefix).ok())
            .collect()
    }

    /// Differences in the user set between `self` and `next`.
    fn user_changes(&self, next: &PolicySnapshot) -> PrincipalsChanged {
        PrincipalsChanged {
            added: next.users.difference(&self.users).cloned().collect(),
            removed: self.users.difference(&next.users).cloned().collect(),
        }
    }
}

/// Serves a [`PolicySnapshot`] through the storage traits.
pub struct MemoryPolicy {
    snapshot: RwLock<Arc<PolicySnapshot>>,
    events: EventBus,
}

impl MemoryPolicy {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self::with_events(snapshot, EventBus::default())
    }

    /// Creates a policy that publishes user-set changes on `events`.
    pub fn with_events(snapshot: PolicySnapshot, events: EventBus) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            events,
        }
    }

    /// The snapshot currently being served.
    pub async fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot.read().await.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Atomically swaps in `next`, publishing `PrincipalsChanged` when the
    /// user set differs.
    pub async fn replace(&self, next: PolicySnapshot) {
        let changes = {
            let mut current = self.snapshot.write().await;
            let changes = current.user_changes(&next);
            *current = Arc::new(next);
            changes
        };

        info!(
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Policy snapshot replaced"
        );

        if !changes.is_empty() {
            self.events.publish(changes);
        }
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryPolicy {
    async fn groups_of(&self, user: &str) -> Result<BTreeSet<String>> {
        Ok(self.snapshot().await.groups_of(user))
    }

    async fn users(&self) -> Result<BTreeSet<String>> {
        Ok(self.snapshot().await.users.clone())
    }
}

#[async_trait]
impl GrantTable for MemoryPolicy {
    async fn principals_for(&self, action: &Action, prefix: &str) -> Result<BTreeSet<String>> {
        let principals = self.snapshot().await.principals_for(action.as_str(), prefix);
        debug!(action = %action, prefix, granted = principals.len(), "Grant lookup");
        Ok(principals)
    }

    async fn resources(&self) -> Result<BTreeSet<ResourcePath>> {
        Ok(self.snapshot().await.grant_resources())
    }
}

#[async_trait]
impl ResourceCatalog for MemoryPolicy {
    async fn list_resources(&self) -> Result<BTreeSet<ResourcePath>> {
        Ok(self.snapshot().await.resources.clone())
    }
}

#[async_trait]
impl HostTrustTable for MemoryPolicy {
    async fn lookup(&self, host: &str) -> Result<Option<bool>> {
        Ok(self.snapshot().await.hosts.get(host).copied())
    }
}
