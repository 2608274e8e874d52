//! The YAML policy document.
//!
//! ```yaml
//! users: [alice, bob]
//! groups:
//!   eng: [carol]
//! grants:
//!   - action: read
//!     resource: /docs
//!     principals: [alice, eng]
//! hosts:
//!   10.0.0.5: true
//! resources: [/docs/readme]
//! ```

use authz::{Action, PolicySnapshot, ResourcePath};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyDocument {
    pub users: BTreeSet<String>,
    pub groups: BTreeMap<String, BTreeSet<String>>,
    pub grants: Vec<GrantEntry>,
    pub hosts: BTreeMap<String, bool>,
    pub resources: BTreeSet<ResourcePath>,
}

/// One action on one resource-prefix granted to a list of principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantEntry {
    pub action: Action,
    pub resource: ResourcePath,
    pub principals: Vec<String>,
}

impl PolicyDocument {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is an empty policy.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn to_snapshot(&self) -> PolicySnapshot {
        let mut snapshot = PolicySnapshot::new();

        for user in &self.users {
            snapshot.add_user(user.clone());
        }
        for (group, members) in &self.groups {
            snapshot.add_group(group.clone());
            for member in members {
                snapshot.add_group_member(group.clone(), member.clone());
            }
        }
        for grant in &self.grants {
            for principal in &grant.principals {
                snapshot.add_grant(&grant.action, &grant.resource, principal.clone());
            }
        }
        for (host, trusted) in &self.hosts {
            snapshot.set_host(host.clone(), *trusted);
        }
        for resource in &self.resources {
            snapshot.add_resource(resource.clone());
        }

        snapshot
    }
}
