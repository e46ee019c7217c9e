//! Configuration loading

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Shortest secret accepted without a warning (HS256 key size)
const MIN_SECRET_BYTES: usize = 32;
/// Longest accepted token lifetime (one year)
const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Bootstrap admin account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Signing secret; a random one is generated per process when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
    #[serde(default = "default_prune_interval_secs")]
    pub revocation_prune_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl_secs(),
            revocation_prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

/// Admin account created on start when missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_first_name")]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_db_path() -> String {
    "./data/passgate.db".to_string()
}

fn default_token_ttl_secs() -> i64 {
    passgate_auth::DEFAULT_TOKEN_TTL_SECS
}

fn default_prune_interval_secs() -> u64 {
    600
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

fn default_admin_first_name() -> String {
    "Admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.token_ttl_secs <= 0 {
            bail!("auth.token_ttl_secs must be positive");
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "auth.token_ttl_secs cannot exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            );
        }
        if self.auth.revocation_prune_interval_secs == 0 {
            bail!("auth.revocation_prune_interval_secs must be positive");
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.is_empty() {
                bail!("auth.jwt_secret cannot be empty");
            }
            if secret.len() < MIN_SECRET_BYTES {
                warn!(
                    "auth.jwt_secret is shorter than {} bytes; use a longer secret",
                    MIN_SECRET_BYTES
                );
            }
        }
        if let Some(admin) = &self.admin
            && (admin.username.is_empty() || admin.password.is_empty())
        {
            bail!("admin.username and admin.password are required when [admin] is set");
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            bail!("logging.format must be \"pretty\" or \"json\"");
        }
        Ok(())
    }
}
