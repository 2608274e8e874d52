//! Credentials listed directly in configuration.

use async_trait::async_trait;
use authz::AuthenticationProvider;
use std::collections::HashMap;
use tracing::debug;

use crate::password::verify_password_blocking;

/// Verifies against a fixed username -> argon2 hash map.
pub struct StaticProvider {
    name: String,
    users: HashMap<String, String>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, users: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            users,
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl AuthenticationProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn verify(&self, username: &str, credential: &str) -> authz::Result<bool> {
        let Some(hash) = self.users.get(username) else {
            debug!(provider = %self.name, username, "Unknown user");
            return Ok(false);
        };

        verify_password_blocking(hash.clone(), credential.to_string())
            .await
            .map_err(|e| e.into_authz(&self.name))
    }
}
