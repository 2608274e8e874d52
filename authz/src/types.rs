//! Core value types for access decisions.
//!
//! A decision is asked about a user name, an [`Action`] and a
//! [`ResourcePath`]. Names are opaque strings; only resource paths carry
//! structure, and that structure is what the resolver walks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthzError, Result};

/// Represents an action being performed in an authorization request.
///
/// Actions are compared case-sensitively and have no hierarchy among
/// themselves: `read` does not imply `list`, `GET` is not `get`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Action {
    /// The name of the action being performed (e.g., "read", "GET")
    name: String,
}

impl Action {
    /// Creates an action, rejecting empty names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AuthzError::invalid_argument("action must not be empty"));
        }
        Ok(Self { name })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl TryFrom<String> for Action {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.name
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A slash-delimited, hierarchical resource name such as `/docs/readme`.
///
/// Paths are normalised on construction: they must start with `/`, and empty
/// segments are dropped, so `/docs//readme/` and `/docs/readme` are the same
/// resource. The root `/` is an ancestor of every path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath(String);

impl ResourcePath {
    /// The root resource, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parses and normalises a resource path.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') {
            return Err(AuthzError::invalid_argument(format!(
                "resource `{raw}` must start with '/'"
            )));
        }

        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Ok(Self::root());
        }

        Ok(Self(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Number of `/`-delimited segments; zero for the root.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0[1..].split('/').count()
        }
    }

    /// The enclosing resource, or `None` for the root.
    pub fn parent(&self) -> Option<ResourcePath> {
        parent_of(&self.0).map(|p| Self(p.to_string()))
    }

    /// Every resource-prefix of this path, longest first, ending at `/`.
    ///
    /// Always yields `depth() + 1` items.
    pub fn prefixes(&self) -> Prefixes<'_> {
        Prefixes {
            next: Some(self.0.as_str()),
        }
    }
}

fn parent_of(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) | None => Some("/"),
        Some(idx) => Some(&path[..idx]),
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Iterator over the resource-prefixes of a [`ResourcePath`].
#[derive(Debug, Clone)]
pub struct Prefixes<'a> {
    next: Option<&'a str>,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = parent_of(current);
        Some(current)
    }
}

/// Rejects empty user names.
pub fn require_user(user: &str) -> Result<&str> {
    if user.is_empty() {
        return Err(AuthzError::invalid_argument("user must not be empty"));
    }
    Ok(user)
}

/// Rejects empty host identifiers.
pub fn require_host(host: &str) -> Result<&str> {
    if host.is_empty() {
        return Err(AuthzError::invalid_argument(
            "host identifier must not be empty",
        ));
    }
    Ok(host)
}
