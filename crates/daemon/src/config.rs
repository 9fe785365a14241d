//! Configuration management for the Homeport daemon.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/homeport/config.toml`.
//! Environment variables override file values, and the session secret is
//! generated randomly when left unset.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("bind must be a socket address like 127.0.0.1:8423, got {0}")]
    InvalidBind(String),

    #[error("session lifetime must be greater than 0 seconds")]
    InvalidSessionLifetime,

    #[error("upload max_size must be greater than 0, got {0}")]
    InvalidMaxSize(u64),

    #[error("secret_key must not be empty")]
    EmptySecret,

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the Homeport daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// The home tree being served.
    pub home: HomeConfig,

    /// Session signing and cookie settings.
    pub session: SessionConfig,

    /// Upload limits.
    pub upload: UploadConfig,

    /// Credential store location.
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,

    /// Optional directory of static assets served at `/`.
    pub static_dir: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// The directory tree exposed by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HomeConfig {
    /// Root of the served tree. Defaults to the user's home directory.
    pub root: PathBuf,
}

/// Session signing and cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC key for session tokens. Empty means "generate at startup".
    pub secret_key: String,

    /// Maximum session age in seconds (default: 30 days).
    pub lifetime_secs: u64,

    /// Mark session cookies as requiring a secure transport.
    pub secure_cookies: bool,
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum upload size in bytes (default: 1 GiB).
    pub max_size: u64,
}

/// Credential store location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Path of the TOML credentials file.
    pub credentials_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8423".to_string(),
            static_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            lifetime_secs: 2_592_000, // 30 days
            secure_cookies: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size: 1_073_741_824, // 1 GiB
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_config_dir().join("credentials.toml"),
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("homeport")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - HOMEPORT_BIND: listen address
    /// - HOMEPORT_LOG_LEVEL: log level (trace, debug, info, warn, error)
    /// - HOMEPORT_HOME_ROOT: root of the served tree
    /// - HOMEPORT_SECRET_KEY: session signing key
    /// - HOMEPORT_SESSION_LIFETIME: session lifetime in seconds
    /// - HOMEPORT_SECURE_COOKIES: "true" to require a secure transport
    /// - HOMEPORT_UPLOAD_MAX_SIZE: upload ceiling in bytes
    pub fn apply_env_overrides(&mut self) {
        if let Some(bind) = non_empty_env("HOMEPORT_BIND") {
            self.server.bind = bind;
        }
        if let Some(level) = non_empty_env("HOMEPORT_LOG_LEVEL") {
            self.server.log_level = level;
        }
        if let Some(root) = non_empty_env("HOMEPORT_HOME_ROOT") {
            self.home.root = PathBuf::from(root);
        }
        if let Some(secret) = non_empty_env("HOMEPORT_SECRET_KEY") {
            self.session.secret_key = secret;
        }
        if let Some(lifetime) = non_empty_env("HOMEPORT_SESSION_LIFETIME") {
            match lifetime.parse() {
                Ok(secs) => self.session.lifetime_secs = secs,
                Err(_) => tracing::warn!(
                    value = %lifetime,
                    "ignoring unparsable HOMEPORT_SESSION_LIFETIME"
                ),
            }
        }
        if let Some(flag) = non_empty_env("HOMEPORT_SECURE_COOKIES") {
            self.session.secure_cookies = flag.eq_ignore_ascii_case("true") || flag == "1";
        }
        if let Some(size) = non_empty_env("HOMEPORT_UPLOAD_MAX_SIZE") {
            match size.parse() {
                Ok(bytes) => self.upload.max_size = bytes,
                Err(_) => tracing::warn!(
                    value = %size,
                    "ignoring unparsable HOMEPORT_UPLOAD_MAX_SIZE"
                ),
            }
        }
    }

    /// Generates a random session secret if none is configured.
    ///
    /// Sessions signed with a generated secret do not survive a restart.
    pub fn ensure_session_secret(&mut self) {
        if self.session.secret_key.is_empty() {
            let mut bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut bytes);
            self.session.secret_key = hex::encode(bytes);
            tracing::info!(
                "generated ephemeral session secret; set session.secret_key to persist sessions across restarts"
            );
        }
    }

    /// Validate the configuration values.
    ///
    /// Returns an error if any configuration value is outside the valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidBind(self.server.bind.clone()));
        }

        if self.session.lifetime_secs == 0 {
            return Err(ConfigError::InvalidSessionLifetime);
        }

        if self.upload.max_size == 0 {
            return Err(ConfigError::InvalidMaxSize(self.upload.max_size));
        }

        if self.session.secret_key.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let level = self.server.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.server.log_level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {e}"))
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
