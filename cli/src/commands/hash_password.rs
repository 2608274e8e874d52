use anyhow::{Context, Result};

/// Print an argon2 hash for a static or htpasswd credential entry.
pub fn execute(password: &str) -> Result<()> {
    let hash = authn::hash_password(password).context("Failed to hash password")?;
    println!("{}", hash);
    Ok(())
}
