//! Writes to a SQLite policy store.
//!
//! Changes land in the database only; a running server serves them after
//! its next refresh.

use anyhow::Result;
use authz::{Action, ResourcePath};
use colored::*;
use store::SqlitePolicyStore;

fn done(message: String) {
    println!("{} {}", "✓".green(), message);
}

pub async fn add_user(store: &SqlitePolicyStore, user: &str) -> Result<()> {
    store.add_user(user).await?;
    done(format!("Added user {}", user.cyan()));
    Ok(())
}

/// Drops the user and their memberships. Grants naming them stay.
pub async fn remove_user(store: &SqlitePolicyStore, user: &str) -> Result<()> {
    store.remove_user(user).await?;
    done(format!("Removed user {}", user.cyan()));
    Ok(())
}

pub async fn add_member(store: &SqlitePolicyStore, group: &str, user: &str) -> Result<()> {
    store.add_group_member(group, user).await?;
    done(format!("Added {} to {}", user.cyan(), group.cyan()));
    Ok(())
}

pub async fn grant(
    store: &SqlitePolicyStore,
    action: &str,
    resource: &str,
    principal: &str,
) -> Result<()> {
    let action = Action::new(action)?;
    let resource = ResourcePath::parse(resource)?;

    store.add_grant(&action, &resource, principal).await?;
    done(format!(
        "Granted {} on {} to {}",
        action.as_str().yellow(),
        resource,
        principal.cyan()
    ));
    Ok(())
}

pub async fn set_host(store: &SqlitePolicyStore, host: &str, trusted: bool) -> Result<()> {
    store.set_host(host, trusted).await?;
    let rule = if trusted { "trusted" } else { "untrusted" };
    done(format!("{} is {}", host.cyan(), rule));
    Ok(())
}

pub async fn add_resource(store: &SqlitePolicyStore, resource: &str) -> Result<()> {
    let resource = ResourcePath::parse(resource)?;
    store.add_resource(&resource).await?;
    done(format!("Listed {}", resource));
    Ok(())
}
