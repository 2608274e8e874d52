//! The Authorization Resolver.
//!
//! A user may perform an action on a resource when some resource-prefix of
//! that resource (the resource itself, each parent, and `/`) carries a grant
//! for the action naming the user, or naming a group the user belongs to.
//! There is no deny rule, so adding grants can only widen access.

use futures::{stream, Stream, StreamExt, TryStreamExt};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::directory::PrincipalDirectory;
use crate::error::{AuthzError, Result};
use crate::grants::{GrantTable, ResourceCatalog};
use crate::types::{require_user, Action, ResourcePath};

/// Compiled patterns larger than this are rejected.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Answers point and enumeration authorization queries.
#[derive(Clone)]
pub struct AuthorizationResolver {
    directory: Arc<dyn PrincipalDirectory>,
    grants: Arc<dyn GrantTable>,
    catalog: Option<Arc<dyn ResourceCatalog>>,
}

impl AuthorizationResolver {
    pub fn new(directory: Arc<dyn PrincipalDirectory>, grants: Arc<dyn GrantTable>) -> Self {
        Self {
            directory,
            grants,
            catalog: None,
        }
    }

    /// Adds an external resource listing to the universe enumerated by
    /// [`matching_resources`](Self::matching_resources).
    pub fn with_catalog(mut self, catalog: Arc<dyn ResourceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Whether `user` may perform `action` on `resource`.
    pub async fn is_authorized(&self, user: &str, action: &str, resource: &str) -> Result<bool> {
        let user = require_user(user)?;
        let action = Action::new(action)?;
        let resource = ResourcePath::parse(resource)?;

        self.check(user, &action, &resource).await
    }

    async fn check(&self, user: &str, action: &Action, resource: &ResourcePath) -> Result<bool> {
        // Fetched on first need and reused for every remaining prefix.
        let mut member_of: Option<BTreeSet<String>> = None;

        for prefix in resource.prefixes() {
            let principals = self.grants.principals_for(action, prefix).await?;
            if principals.is_empty() {
                continue;
            }

            // A name matching both a user and a group grants through either.
            if principals.contains(user) {
                debug!(user, action = %action, prefix, "Granted to user directly");
                return Ok(true);
            }

            let groups = match &mut member_of {
                Some(groups) => groups,
                slot => slot.insert(self.directory.groups_of(user).await?),
            };

            if let Some(group) = principals.iter().find(|name| groups.contains(*name)) {
                debug!(user, action = %action, prefix, group = %group, "Granted through group");
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Resources whose path matches `pattern` and that `user` may perform
    /// `action` on.
    ///
    /// The pattern is anchored at both ends. Candidates are gathered once,
    /// here; the authorization filter runs lazily each time the returned
    /// matches are streamed.
    pub async fn matching_resources(
        &self,
        user: &str,
        action: &str,
        pattern: &str,
    ) -> Result<ResourceMatches> {
        let user = require_user(user)?.to_string();
        let action = Action::new(action)?;
        let regex = compile_pattern(pattern)?;

        let mut universe = self.grants.resources().await?;
        if let Some(catalog) = &self.catalog {
            universe.extend(catalog.list_resources().await?);
        }

        let candidates: Vec<ResourcePath> = universe
            .into_iter()
            .filter(|resource| regex.is_match(resource.as_str()))
            .collect();

        debug!(
            user = %user,
            action = %action,
            pattern,
            candidates = candidates.len(),
            "Resource enumeration prepared"
        );

        Ok(ResourceMatches {
            resolver: self.clone(),
            user,
            action,
            candidates: Arc::new(candidates),
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| AuthzError::invalid_argument(format!("invalid pattern `{pattern}`: {e}")))
}

/// The result of a `MatchingResources` query.
///
/// Holds the pattern-filtered candidates in path order. Each call to
/// [`stream`](Self::stream) starts a fresh pass, so the sequence can be
/// consumed any number of times.
#[derive(Clone)]
pub struct ResourceMatches {
    resolver: AuthorizationResolver,
    user: String,
    action: Action,
    candidates: Arc<Vec<ResourcePath>>,
}

impl ResourceMatches {
    /// Resources matching the pattern, before the authorization filter.
    pub fn candidates(&self) -> &[ResourcePath] {
        &self.candidates
    }

    /// Lazily yields each candidate the user is authorized for.
    pub fn stream(&self) -> impl Stream<Item = Result<ResourcePath>> + Send + '_ {
        stream::iter(self.candidates.iter()).filter_map(move |resource| async move {
            match self.resolver.check(&self.user, &self.action, resource).await {
                Ok(true) => Some(Ok(resource.clone())),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            }
        })
    }

    /// Drains [`stream`](Self::stream) into a vector, in path order.
    pub async fn collect(&self) -> Result<Vec<ResourcePath>> {
        self.stream().try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryPolicy, PolicySnapshot};

    fn action(name: &str) -> Action {
        Action::new(name).unwrap()
    }

    fn path(raw: &str) -> ResourcePath {
        ResourcePath::parse(raw).unwrap()
    }

    fn resolver(snapshot: PolicySnapshot) -> AuthorizationResolver {
        let policy = Arc::new(MemoryPolicy::new(snapshot));
        AuthorizationResolver::new(policy.clone(), policy.clone()).with_catalog(policy)
    }

    fn paths(resources: &[ResourcePath]) -> Vec<&str> {
        resources.iter().map(ResourcePath::as_str).collect()
    }

    #[tokio::test]
    async fn test_direct_grant_covers_descendants() {
        let resolver = resolver(
            PolicySnapshot::new()
                .with_user("alice")
                .with_user("bob")
                .with_grant(action("read"), path("/docs"), "alice"),
        );

        assert!(resolver.is_authorized("alice", "read", "/docs").await.unwrap());
        assert!(resolver
            .is_authorized("alice", "read", "/docs/readme")
            .await
            .unwrap());
        assert!(!resolver.is_authorized("alice", "read", "/").await.unwrap());
        assert!(!resolver
            .is_authorized("alice", "read", "/docsets")
            .await
            .unwrap());
        assert!(!resolver
            .is_authorized("bob", "read", "/docs/readme")
            .await
            .unwrap());
        assert!(!resolver
            .is_authorized("alice", "write", "/docs/readme")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_root_grant_covers_everything() {
        let resolver = resolver(
            PolicySnapshot::new().with_grant(action("read"), ResourcePath::root(), "alice"),
        );

        for resource in ["/", "/a", "/a/b/c/d/e/f/g/h"] {
            assert!(
                resolver.is_authorized("alice", "read", resource).await.unwrap(),
                "{resource}"
            );
        }
    }

    #[tokio::test]
    async fn test_group_grant() {
        let resolver = resolver(
            PolicySnapshot::new()
                .with_group("eng", ["carol"])
                .with_grant(action("read"), ResourcePath::root(), "eng"),
        );

        assert!(resolver
            .is_authorized("carol", "read", "/anything/deep/path")
            .await
            .unwrap());
        assert!(!resolver
            .is_authorized("dave", "read", "/anything")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_name_matching_user_and_group() {
        // "ops" is both a user and a group containing erin.
        let resolver = resolver(
            PolicySnapshot::new()
                .with_user("ops")
                .with_group("ops", ["erin"])
                .with_grant(action("deploy"), path("/services"), "ops"),
        );

        assert!(resolver
            .is_authorized("ops", "deploy", "/services/api")
            .await
            .unwrap());
        assert!(resolver
            .is_authorized("erin", "deploy", "/services/api")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_actions_are_case_sensitive() {
        let resolver = resolver(
            PolicySnapshot::new().with_grant(action("GET"), ResourcePath::root(), "alice"),
        );
        assert!(resolver.is_authorized("alice", "GET", "/x").await.unwrap());
        assert!(!resolver.is_authorized("alice", "get", "/x").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let resolver = resolver(PolicySnapshot::new());

        for (user, action, resource) in [
            ("", "read", "/docs"),
            ("alice", "", "/docs"),
            ("alice", "read", "docs"),
            ("alice", "read", ""),
        ] {
            let err = resolver
                .is_authorized(user, action, resource)
                .await
                .unwrap_err();
            assert!(err.is_invalid_argument(), "{user}/{action}/{resource}");
        }
    }

    #[tokio::test]
    async fn test_matching_resources_filters_by_pattern_and_grant() {
        let resolver = resolver(
            PolicySnapshot::new()
                .with_grant(action("read"), path("/docs"), "alice")
                .with_grant(action("read"), path("/private"), "bob")
                .with_resource(path("/docs/readme"))
                .with_resource(path("/docs/guide"))
                .with_resource(path("/private/keys")),
        );

        let matches = resolver
            .matching_resources("alice", "read", "/docs/.*")
            .await
            .unwrap();
        assert_eq!(paths(matches.candidates()), vec!["/docs/guide", "/docs/readme"]);
        assert_eq!(
            paths(&matches.collect().await.unwrap()),
            vec!["/docs/guide", "/docs/readme"]
        );

        let all = resolver
            .matching_resources("alice", "read", ".*")
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(paths(&all), vec!["/docs", "/docs/guide", "/docs/readme"]);
    }

    #[tokio::test]
    async fn test_matching_resources_is_anchored() {
        let resolver = resolver(
            PolicySnapshot::new()
                .with_grant(action("read"), ResourcePath::root(), "alice")
                .with_resource(path("/docs"))
                .with_resource(path("/docs/readme")),
        );

        let matches = resolver
            .matching_resources("alice", "read", "/docs")
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(paths(&matches), vec!["/docs"]);
    }

    #[tokio::test]
    async fn test_matching_resources_is_restartable() {
        let resolver = resolver(
            PolicySnapshot::new()
                .with_grant(action("read"), path("/a"), "alice")
                .with_resource(path("/a/1"))
                .with_resource(path("/a/2")),
        );

        let matches = resolver
            .matching_resources("alice", "read", ".*")
            .await
            .unwrap();
        let first = matches.collect().await.unwrap();
        let second = matches.collect().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let resolver = resolver(PolicySnapshot::new());
        let err = resolver
            .matching_resources("alice", "read", "(unclosed")
            .await
            .err()
            .unwrap();
        assert!(err.is_invalid_argument());
    }
}
