//! Refresh of cached provider state.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AuthzError, Result};

/// A provider that keeps an in-memory copy of its backing store.
#[async_trait]
pub trait Refreshable: Send + Sync {
    fn name(&self) -> &str;

    /// Reloads from the backing store. On failure the previous copy must
    /// stay in service.
    async fn refresh(&self) -> Result<()>;
}

/// One provider that failed to refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshFailure {
    pub provider: String,
    pub message: String,
}

/// Outcome of [`RefreshRegistry::refresh_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Providers that reloaded successfully, in registration order.
    pub refreshed: Vec<String>,
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// `RefreshPartialFailure` when any provider failed.
    pub fn as_error(&self) -> Option<AuthzError> {
        if self.is_complete() {
            None
        } else {
            Some(AuthzError::RefreshPartialFailure(self.failures.len()))
        }
    }
}

/// Refreshable providers in registration order.
#[derive(Clone, Default)]
pub struct RefreshRegistry {
    providers: Vec<Arc<dyn Refreshable>>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn Refreshable>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Refreshes every provider, best effort. A failure is recorded and the
    /// remaining providers still run.
    pub async fn refresh_all(&self) -> RefreshReport {
        let mut report = RefreshReport::default();

        for provider in &self.providers {
            match provider.refresh().await {
                Ok(()) => report.refreshed.push(provider.name().to_string()),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Refresh failed");
                    report.failures.push(RefreshFailure {
                        provider: provider.name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            refreshed = report.refreshed.len(),
            failed = report.failures.len(),
            "Refresh complete"
        );
        report
    }
}
