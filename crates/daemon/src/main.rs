//! Homeport Daemon
//!
//! Authenticated HTTP access to a confined home directory.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use daemon::auth::{CredentialFile, TokenSigner};
use daemon::config::{default_config_path, Config};
use daemon::http::{self, AppState};
use vault::Vault;

/// Homeport Daemon - authenticated HTTP access to a confined home directory.
#[derive(Parser, Debug)]
#[command(name = "homeport")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the daemon.
#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overriding the configured one
        #[arg(long)]
        bind: Option<String>,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Manage the credentials file
    #[command(subcommand)]
    User(UserCommands),
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug, Clone)]
enum ConfigCommands {
    /// Write a fresh configuration file with defaults
    Init,
}

/// Subcommands for credential management.
#[derive(Subcommand, Debug, Clone)]
enum UserCommands {
    /// Add a user (or reset an existing user's password)
    Add {
        /// Username to add
        username: String,
    },

    /// Remove a user
    Remove {
        /// Username to remove
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let mut config = Config::load(&config_path)?;
    config.apply_env_overrides();

    init_tracing(&config.server.log_level, cli.verbose);

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            config.ensure_session_secret();
            config.validate().context("invalid configuration")?;
            serve(config).await
        }

        Commands::Config(ConfigCommands::Init) => {
            if config_path.exists() {
                bail!("config file already exists: {}", config_path.display());
            }
            let mut fresh = Config::default();
            fresh.ensure_session_secret();
            fresh.save(&config_path)?;
            println!("wrote {}", config_path.display());
            Ok(())
        }

        Commands::User(UserCommands::Add { username }) => {
            let mut store = CredentialFile::load(&config.auth.credentials_path)?;
            let password = prompt_password(&format!("Password for {username}: "))?;
            if password.is_empty() {
                bail!("password must not be empty");
            }
            store.set_password(&username, &password);
            store.save()?;
            println!(
                "stored credentials for {username} in {}",
                config.auth.credentials_path.display()
            );
            Ok(())
        }

        Commands::User(UserCommands::Remove { username }) => {
            let mut store = CredentialFile::load(&config.auth.credentials_path)?;
            if !store.remove_user(&username) {
                bail!("no such user: {username}");
            }
            store.save()?;
            println!("removed {username}");
            Ok(())
        }
    }
}

/// Runs the HTTP server until ctrl-c.
async fn serve(config: Config) -> Result<()> {
    let vault = Vault::new(&config.home.root).with_context(|| {
        format!(
            "cannot open home root: {}",
            config.home.root.display()
        )
    })?;
    info!(root = %vault.root().display(), "serving home tree");

    let credentials = CredentialFile::load(&config.auth.credentials_path)?;
    if credentials.is_empty() {
        tracing::warn!(
            path = %config.auth.credentials_path.display(),
            "credentials file has no users; every login will fail"
        );
    }

    let state = Arc::new(AppState {
        vault: Arc::new(vault),
        signer: TokenSigner::new(&config.session.secret_key),
        authenticator: Arc::new(credentials),
        session_lifetime: config.session.lifetime_secs,
        secure_cookies: config.session.secure_cookies,
        upload_max_size: config.upload.max_size,
    });

    let app = http::router(state, config.server.static_dir.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_tracing(level: &str, verbose: bool) {
    let directive = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn prompt_password(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
