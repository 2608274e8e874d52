//! The Principal Directory: users, groups and who belongs where.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::Result;

/// Answers group-membership questions about users.
///
/// Membership is flat: a group's members are users, never other groups.
/// Implementations backed by remote stores may block on I/O; failures are
/// reported as [`AuthzError::BackendUnavailable`](crate::AuthzError).
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Every group that lists `user` as a member. Unknown users have none.
    async fn groups_of(&self, user: &str) -> Result<BTreeSet<String>>;

    /// Every known user name.
    async fn users(&self) -> Result<BTreeSet<String>>;

    /// Whether `user` is a member of `group`.
    async fn is_member(&self, user: &str, group: &str) -> Result<bool> {
        Ok(self.groups_of(user).await?.contains(group))
    }
}
