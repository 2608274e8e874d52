//! Writes to a SQLite credential store.

use anyhow::{anyhow, bail, Result};
use authn::SqliteCredentialProvider;
use colored::*;

pub async fn set_password(
    store: &SqliteCredentialProvider,
    user: &str,
    password: Option<&str>,
) -> Result<()> {
    if user.is_empty() {
        bail!("User name must not be empty");
    }
    let password = password
        .ok_or_else(|| anyhow!("No password given: pass --password or set WARDEN_PASSWORD"))?;

    store.set_password(user, password).await?;
    println!("{} Password set for {}", "✓".green(), user.cyan());
    Ok(())
}

/// Returns whether the user existed.
pub async fn remove(store: &SqliteCredentialProvider, user: &str) -> Result<bool> {
    let removed = store.remove_user(user).await?;

    if removed {
        println!("{} Removed {}", "✓".green(), user.cyan());
    } else {
        println!("{} No credentials stored for {}", "!".yellow(), user.cyan());
    }

    Ok(removed)
}
