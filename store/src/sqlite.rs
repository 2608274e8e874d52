//! Policy served from a SQLite database.
//!
//! Writes go to the database only. The served snapshot changes on
//! [`Refreshable::refresh`], which reads every table in one transaction.

use async_trait::async_trait;
use authz::types::{require_host, require_user};
use authz::{Action, EventBus, MemoryPolicy, PolicySnapshot, Refreshable, ResourcePath};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;

pub struct SqlitePolicyStore {
    name: String,
    pool: Pool<Sqlite>,
    policy: Arc<MemoryPolicy>,
    /// Held across load and replace so reloads install in order.
    reload: Mutex<()>,
}

impl SqlitePolicyStore {
    /// Opens (creating when missing) the database at `path`.
    pub async fn connect(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        events: EventBus,
    ) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        )
        .await?;

        info!(path = %path.display(), "Policy database opened");
        Self::with_pool(name, pool, events).await
    }

    /// Wraps an existing pool, creating tables and loading the first
    /// snapshot.
    pub async fn with_pool(
        name: impl Into<String>,
        pool: Pool<Sqlite>,
        events: EventBus,
    ) -> Result<Self> {
        create_tables(&pool).await?;
        let snapshot = load(&pool).await?;
        let name = name.into();

        info!(
            provider = %name,
            users = snapshot.users().len(),
            grants = snapshot.grant_count(),
            hosts = snapshot.host_count(),
            "Policy database loaded"
        );

        Ok(Self {
            name,
            pool,
            policy: Arc::new(MemoryPolicy::with_events(snapshot, events)),
            reload: Mutex::new(()),
        })
    }

    pub fn policy(&self) -> Arc<MemoryPolicy> {
        self.policy.clone()
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn add_user(&self, user: &str) -> Result<()> {
        require_user(user)?;
        sqlx::query("INSERT OR IGNORE INTO users (name) VALUES (?)")
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes the user and their group memberships. Grants naming the user
    /// stay, since a group may share the name.
    pub async fn remove_user(&self, user: &str) -> Result<()> {
        require_user(user)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM users WHERE name = ?")
            .bind(user)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM group_members WHERE member = ?")
            .bind(user)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn add_group_member(&self, group: &str, user: &str) -> Result<()> {
        require_user(user)?;
        if group.is_empty() {
            return Err(authz::AuthzError::invalid_argument("group must not be empty").into());
        }
        sqlx::query("INSERT OR IGNORE INTO group_members (group_name, member) VALUES (?, ?)")
            .bind(group)
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_grant(
        &self,
        action: &Action,
        resource: &ResourcePath,
        principal: &str,
    ) -> Result<()> {
        if principal.is_empty() {
            return Err(authz::AuthzError::invalid_argument("principal must not be empty").into());
        }
        sqlx::query("INSERT OR IGNORE INTO grants (action, resource, principal) VALUES (?, ?, ?)")
            .bind(action.as_str())
            .bind(resource.as_str())
            .bind(principal)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_host(&self, host: &str, trusted: bool) -> Result<()> {
        require_host(host)?;
        sqlx::query(
            r#"
            INSERT INTO hosts (host, trusted) VALUES (?, ?)
            ON CONFLICT(host) DO UPDATE SET trusted = excluded.trusted
            "#,
        )
        .bind(host)
        .bind(trusted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn add_resource(&self, resource: &ResourcePath) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO resources (path) VALUES (?)")
            .bind(resource.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn create_tables(pool: &Pool<Sqlite>) -> Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS users (name TEXT PRIMARY KEY)",
        r#"
        CREATE TABLE IF NOT EXISTS group_members (
            group_name TEXT NOT NULL,
            member TEXT NOT NULL,
            PRIMARY KEY (group_name, member)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS grants (
            action TEXT NOT NULL,
            resource TEXT NOT NULL,
            principal TEXT NOT NULL,
            PRIMARY KEY (action, resource, principal)
        )
        "#,
        "CREATE TABLE IF NOT EXISTS hosts (host TEXT PRIMARY KEY, trusted BOOLEAN NOT NULL)",
        "CREATE TABLE IF NOT EXISTS resources (path TEXT PRIMARY KEY)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

async fn load(pool: &Pool<Sqlite>) -> Result<PolicySnapshot> {
    let mut tx = pool.begin().await?;
    let mut snapshot = PolicySnapshot::new();

    let users: Vec<String> = sqlx::query_scalar("SELECT name FROM users")
        .fetch_all(&mut *tx)
        .await?;
    for user in users {
        snapshot.add_user(user);
    }

    let members: Vec<(String, String)> =
        sqlx::query_as("SELECT group_name, member FROM group_members")
            .fetch_all(&mut *tx)
            .await?;
    for (group, member) in members {
        snapshot.add_group_member(group, member);
    }

    let grants: Vec<(String, String, String)> =
        sqlx::query_as("SELECT action, resource, principal FROM grants")
            .fetch_all(&mut *tx)
            .await?;
    for (action, resource, principal) in grants {
        let action = Action::new(action)?;
        let resource = ResourcePath::parse(&resource)?;
        snapshot.add_grant(&action, &resource, principal);
    }

    let hosts: Vec<(String, bool)> = sqlx::query_as("SELECT host, trusted FROM hosts")
        .fetch_all(&mut *tx)
        .await?;
    for (host, trusted) in hosts {
        snapshot.set_host(host, trusted);
    }

    let resources: Vec<String> = sqlx::query_scalar("SELECT path FROM resources")
        .fetch_all(&mut *tx)
        .await?;
    for resource in resources {
        snapshot.add_resource(ResourcePath::parse(&resource)?);
    }

    tx.commit().await?;
    Ok(snapshot)
}

#[async_trait]
impl Refreshable for SqlitePolicyStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn refresh(&self) -> authz::Result<()> {
        let _reload = self.reload.lock().await;
        let snapshot = load(&self.pool)
            .await
            .map_err(|e| e.into_authz(&self.name))?;
        self.policy.replace(snapshot).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use authz::{GrantTable, HostTrustTable, PrincipalDirectory, ResourceCatalog};

    async fn store() -> (tempfile::TempDir, SqlitePolicyStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.db");
        let store = SqlitePolicyStore::connect("sqlite", path, EventBus::default())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_empty_database() {
        let (_dir, store) = store().await;
        let policy = store.policy();
        assert!(policy.users().await.unwrap().is_empty());
        assert_eq!(policy.lookup("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writes_visible_after_refresh() {
        let (_dir, store) = store().await;
        let read = Action::new("read").unwrap();
        let docs = ResourcePath::parse("/docs").unwrap();

        store.add_user("alice").await.unwrap();
        store.add_group_member("eng", "carol").await.unwrap();
        store.add_grant(&read, &docs, "eng").await.unwrap();
        store.set_host("10.0.0.1", true).await.unwrap();
        store.set_host("10.0.0.1", false).await.unwrap();
        store
            .add_resource(&ResourcePath::parse("/docs/readme").unwrap())
            .await
            .unwrap();

        let policy = store.policy();
        assert!(policy.users().await.unwrap().is_empty());

        store.refresh().await.unwrap();
        assert!(policy.users().await.unwrap().contains("alice"));
        assert!(policy.is_member("carol", "eng").await.unwrap());
        assert!(policy.principals_for(&read, "/docs").await.unwrap().contains("eng"));
        assert_eq!(policy.lookup("10.0.0.1").await.unwrap(), Some(false));
        assert_eq!(policy.list_resources().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_user_drops_memberships() {
        let (_dir, store) = store().await;
        store.add_user("bob").await.unwrap();
        store.add_group_member("eng", "bob").await.unwrap();
        store.refresh().await.unwrap();

        store.remove_user("bob").await.unwrap();
        store.refresh().await.unwrap();

        let policy = store.policy();
        assert!(!policy.users().await.unwrap().contains("bob"));
        assert!(!policy.is_member("bob", "eng").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_validation() {
        let (_dir, store) = store().await;
        assert!(matches!(store.add_user("").await, Err(StoreError::Invalid(_))));
        assert!(matches!(store.set_host("", true).await, Err(StoreError::Invalid(_))));
        assert!(matches!(
            store.add_group_member("", "bob").await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_row_fails_refresh_and_keeps_snapshot() {
        let (_dir, store) = store().await;
        store.add_user("alice").await.unwrap();
        store.refresh().await.unwrap();

        sqlx::query("INSERT INTO grants VALUES ('read', 'no-slash', 'alice')")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.refresh().await.unwrap_err();
        assert!(err.is_backend_unavailable());
        assert!(store.policy().users().await.unwrap().contains("alice"));
    }

    #[tokio::test]
    async fn test_refresh_waits_for_reload_in_progress() {
        let (_dir, store) = store().await;
        let store = Arc::new(store);
        let guard = store.reload.lock().await;
        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!pending.is_finished());

        store.add_user("erin").await.unwrap();
        drop(guard);
        pending.await.unwrap().unwrap();
        assert!(store.policy().users().await.unwrap().contains("erin"));
    }
}
