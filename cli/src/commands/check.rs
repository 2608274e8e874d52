//! One-shot decisions against the configured providers.
//!
//! Each check returns whether the answer was yes; the caller turns that into
//! the exit status.

use anyhow::{anyhow, Result};
use authz::DecisionService;
use colored::*;
use serde_json::json;

fn verdict(allowed: bool, yes: &str, no: &str) -> ColoredString {
    if allowed {
        yes.green().bold()
    } else {
        no.red().bold()
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn authz(
    service: &DecisionService,
    user: &str,
    action: &str,
    resource: &str,
    format: &str,
) -> Result<bool> {
    let allowed = service.is_authorized(user, action, resource).await?;

    match format {
        "json" => print_json(&json!({
            "allowed": allowed,
            "user": user,
            "action": action,
            "resource": resource,
        }))?,
        _ => println!(
            "{} {} {} {}",
            verdict(allowed, "ALLOWED", "DENIED"),
            user.cyan(),
            action.yellow(),
            resource
        ),
    }

    Ok(allowed)
}

/// Allowed when at least one resource matches.
pub async fn resources(
    service: &DecisionService,
    user: &str,
    action: &str,
    pattern: &str,
    format: &str,
) -> Result<bool> {
    let resources: Vec<String> = service
        .matching_resources(user, action, pattern)
        .await?
        .collect()
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    match format {
        "json" => print_json(&json!({ "resources": resources }))?,
        _ => {
            if resources.is_empty() {
                println!("{}", "No matching resources".yellow());
            }
            for resource in &resources {
                println!("{}", resource);
            }
        }
    }

    Ok(!resources.is_empty())
}

pub async fn host(service: &DecisionService, host: &str, format: &str) -> Result<bool> {
    let trusted = service.is_trusted_host(host).await?;

    match format {
        "json" => print_json(&json!({ "allowed": trusted, "host": host }))?,
        _ => println!("{} {}", verdict(trusted, "TRUSTED", "UNTRUSTED"), host.cyan()),
    }

    Ok(trusted)
}

pub async fn auth(
    service: &DecisionService,
    user: &str,
    credential: Option<&str>,
    format: &str,
) -> Result<bool> {
    let credential = credential
        .ok_or_else(|| anyhow!("No credential given: pass --credential or set WARDEN_CREDENTIAL"))?;
    let accepted = service.authenticate(user, credential).await?;

    match format {
        "json" => print_json(&json!({ "allowed": accepted, "user": user }))?,
        _ => println!(
            "{} {}",
            verdict(accepted, "ACCEPTED", "REJECTED"),
            user.cyan()
        ),
    }

    Ok(accepted)
}
