//! Credentials stored in a SQLite table.

use async_trait::async_trait;
use authz::AuthenticationProvider;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::password::{hash_password, verify_password_blocking};

/// Looks credentials up per request; there is nothing to refresh.
pub struct SqliteCredentialProvider {
    name: String,
    pool: Pool<Sqlite>,
}

impl SqliteCredentialProvider {
    /// Opens (creating when missing) the database at `path`.
    pub async fn connect(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
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

        info!(path = %path.display(), "Credential database opened");
        Self::with_pool(name, pool).await
    }

    /// Wraps an existing pool, creating the table when needed.
    pub async fn with_pool(name: impl Into<String>, pool: Pool<Sqlite>) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            name: name.into(),
            pool,
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Stores a fresh hash of `password`, replacing any existing one.
    pub async fn set_password(&self, username: &str, password: &str) -> Result<()> {
        let hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO credentials (username, password_hash) VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash
            "#,
        )
        .bind(username)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        info!(provider = %self.name, username, "Password set");
        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn remove_user(&self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM credentials WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stored_hash(&self, username: &str) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM credentials WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }
}

#[async_trait]
impl AuthenticationProvider for SqliteCredentialProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn verify(&self, username: &str, credential: &str) -> authz::Result<bool> {
        let stored = self
            .stored_hash(username)
            .await
            .map_err(|e| e.into_authz(&self.name))?;

        let Some(hash) = stored else {
            debug!(provider = %self.name, username, "Unknown user");
            return Ok(false);
        };

        verify_password_blocking(hash, credential.to_string())
            .await
            .map_err(|e| e.into_authz(&self.name))
    }
}
