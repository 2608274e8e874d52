use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

mod bootstrap;
mod commands;
mod config;
mod logging;

use bootstrap::PolicyTarget;
use commands::{check, config as config_cmd, credentials, hash_password, policy, serve};
use config::{WardenConfig, DEFAULT_CONFIG_PATH};

/// Warden - access decisions for users, resources and hosts
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "WARDEN_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP decision server
    Serve,

    /// Ask for a single decision; exits 0 when allowed, 1 when denied, 2 on error
    Check {
        /// Output format (json, text)
        #[arg(short, long, default_value = "text", global = true)]
        format: String,

        #[command(subcommand)]
        target: CheckTarget,
    },

    /// Print an argon2 hash for a static or htpasswd entry
    HashPassword {
        password: String,
    },

    /// Manage users in a SQLite credential store
    Credentials {
        /// Provider name, required when several sqlite providers are configured
        #[arg(long, global = true)]
        provider: Option<String>,

        #[command(subcommand)]
        action: CredentialsAction,
    },

    /// Edit a SQLite policy store; a running server picks changes up on refresh
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CredentialsAction {
    /// Store a new password for USER
    SetPassword {
        user: String,

        /// Password to store
        #[arg(long, env = "WARDEN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Delete USER's credentials; exits 1 when there were none
    Remove { user: String },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Add a known user
    AddUser { user: String },

    /// Remove a user and their group memberships
    RemoveUser { user: String },

    /// Add USER to GROUP
    AddMember { group: String, user: String },

    /// Grant ACTION on RESOURCE and everything below it to PRINCIPAL
    Grant {
        action: String,
        resource: String,
        principal: String,
    },

    /// Set the trust rule for HOST
    SetHost {
        host: String,

        /// Mark the host untrusted instead
        #[arg(long)]
        untrusted: bool,
    },

    /// List a resource for pattern queries
    AddResource { resource: String },
}

#[derive(Subcommand)]
enum CheckTarget {
    /// May USER perform ACTION on RESOURCE?
    Authz {
        user: String,
        action: String,
        resource: String,
    },

    /// Which resources matching PATTERN may USER perform ACTION on?
    Resources {
        user: String,
        action: String,
        pattern: String,
    },

    /// Is HOST trusted?
    Host { host: String },

    /// Do USER's credentials verify?
    Auth {
        user: String,

        /// Credential to verify
        #[arg(long, env = "WARDEN_CREDENTIAL", hide_env_values = true)]
        credential: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print one configuration value
    Get {
        /// Configuration path (e.g., "server.port")
        section: String,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Serve => {
            let config = WardenConfig::load(&cli.config)?;
            serve::execute(config, cli.verbose).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { format, target } => {
            let config = WardenConfig::load(&cli.config)?;
            logging::init_console_logging(&config.logging, cli.verbose);
            let service = bootstrap::build(&config).await?.service;

            let allowed = match target {
                CheckTarget::Authz {
                    user,
                    action,
                    resource,
                } => check::authz(&service, &user, &action, &resource, &format).await?,
                CheckTarget::Resources {
                    user,
                    action,
                    pattern,
                } => check::resources(&service, &user, &action, &pattern, &format).await?,
                CheckTarget::Host { host } => check::host(&service, &host, &format).await?,
                CheckTarget::Auth { user, credential } => {
                    check::auth(&service, &user, credential.as_deref(), &format).await?
                }
            };

            Ok(if allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::HashPassword { password } => {
            hash_password::execute(&password)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Credentials { provider, action } => {
            let config = WardenConfig::load(&cli.config)?;
            logging::init_console_logging(&config.logging, cli.verbose);
            let store = bootstrap::open_credential_store(&config, provider.as_deref()).await?;

            let found = match action {
                CredentialsAction::SetPassword { user, password } => {
                    credentials::set_password(&store, &user, password.as_deref()).await?;
                    true
                }
                CredentialsAction::Remove { user } => credentials::remove(&store, &user).await?,
            };

            Ok(if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::Policy { action } => {
            let config = WardenConfig::load(&cli.config)?;
            logging::init_console_logging(&config.logging, cli.verbose);

            let target = match action {
                PolicyAction::SetHost { .. } => PolicyTarget::Hosts,
                _ => PolicyTarget::Principals,
            };
            let store = bootstrap::open_policy_database(&config, target).await?;

            match action {
                PolicyAction::AddUser { user } => policy::add_user(&store, &user).await?,
                PolicyAction::RemoveUser { user } => policy::remove_user(&store, &user).await?,
                PolicyAction::AddMember { group, user } => {
                    policy::add_member(&store, &group, &user).await?
                }
                PolicyAction::Grant {
                    action,
                    resource,
                    principal,
                } => policy::grant(&store, &action, &resource, &principal).await?,
                PolicyAction::SetHost { host, untrusted } => {
                    policy::set_host(&store, &host, !untrusted).await?
                }
                PolicyAction::AddResource { resource } => {
                    policy::add_resource(&store, &resource).await?
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            let config = WardenConfig::load(&cli.config)?;
            match action {
                ConfigAction::Show { format } => config_cmd::show(&config, &cli.config, &format)?,
                ConfigAction::Get { section, format } => {
                    config_cmd::get(&config, &section, &format)?
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
