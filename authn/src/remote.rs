//! Delegates verification to an HTTP endpoint.
//!
//! The provider issues `GET <url>` with the credential as HTTP Basic auth.
//! A 2xx response accepts, 401 or 403 rejects, and anything else (including
//! a transport failure or timeout) is a hard error.

use async_trait::async_trait;
use authz::AuthenticationProvider;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{AuthnError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RemoteProvider {
    name: String,
    url: String,
    client: Client,
}

impl RemoteProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(AuthnError::Configuration(
                "remote provider url must not be empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            name: name.into(),
            url,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn check(&self, username: &str, credential: &str) -> Result<bool> {
        let response = self
            .client
            .get(&self.url)
            .basic_auth(username, Some(credential))
            .send()
            .await?;

        let status = response.status();
        debug!(provider = %self.name, username, status = status.as_u16(), "Upstream answered");

        match status {
            s if s.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            s => Err(AuthnError::UpstreamStatus(s.as_u16())),
        }
    }
}

#[async_trait]
impl AuthenticationProvider for RemoteProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn verify(&self, username: &str, credential: &str) -> authz::Result<bool> {
        self.check(username, credential)
            .await
            .map_err(|e| e.into_authz(&self.name))
    }
}
