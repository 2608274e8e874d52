//! The Grant Table and the optional external resource listing.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::{Action, ResourcePath};

/// Maps `(action, resource-prefix)` to the principal names granted it.
///
/// A principal name may name a user, a group, or coincidentally both.
#[async_trait]
pub trait GrantTable: Send + Sync {
    /// Principal names granted `action` at exactly `prefix`.
    ///
    /// An empty set means no grant exists for that key.
    async fn principals_for(&self, action: &Action, prefix: &str) -> Result<BTreeSet<String>>;

    /// Every resource-prefix that appears as a grant key, for any action.
    async fn resources(&self) -> Result<BTreeSet<ResourcePath>>;
}

/// A listing of real resources kept outside the grant table.
///
/// `MatchingResources` enumerates the union of this listing and the grant
/// keys.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    async fn list_resources(&self) -> Result<BTreeSet<ResourcePath>>;
}
