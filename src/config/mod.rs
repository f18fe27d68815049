use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::{debug, warn};

/// Config file locations searched when none is given explicitly, in order
const CONFIG_SEARCH_PATHS: [&str; 2] = ["config/app_config.toml", "app_config.toml"];

/// Per-user config location, relative to the home directory
const HOME_CONFIG_PATH: &str = ".user_management_app/config.toml";

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (error, warn, info, debug, trace)
    pub level: String,
    /// Log file to append to; logs go to stderr when unset
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("app.log".to_string()),
        }
    }
}

/// Authentication policy configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AuthenticationConfig {
    /// Consecutive failed logins before the account is locked
    pub max_login_attempts: u32,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self { max_login_attempts: 5 }
    }
}

/// Security configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB for new password hashes
    pub kdf_memory_kib: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { kdf_memory_kib: 19456 }
    }
}

/// Account storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the JSON accounts file
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "accounts.json".to_string() }
    }
}

/// Application configuration
///
/// Every section falls back to its defaults, so a config file only needs the
/// keys it wants to change.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Application version
    pub version: String,
    pub logging: LoggingConfig,
    pub authentication: AuthenticationConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "User Management App".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            logging: LoggingConfig::default(),
            authentication: AuthenticationConfig::default(),
            security: SecurityConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open config file: {}", path.display()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).context("Failed to read config file")?;

    let config = if is_toml(path) {
        toml::from_str(&contents).context("Failed to parse TOML config")?
    } else {
        serde_json::from_str(&contents).context("Failed to parse JSON config")?
    };

    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Save configuration to file
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
    }

    let serialized = if is_toml(path) {
        toml::to_string_pretty(config).context("Failed to serialize config to TOML")?
    } else {
        serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?
    };

    std::fs::write(path, serialized)
        .with_context(|| format!("Failed to write config to file: {}", path.display()))?;

    Ok(())
}

/// Candidate config files, most specific first
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = CONFIG_SEARCH_PATHS.iter().map(PathBuf::from).collect();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(HOME_CONFIG_PATH));
    }
    paths
}

/// Resolve the configuration to run with.
///
/// An explicit path must load. Otherwise the search paths are tried and a
/// file that fails to parse is skipped with a warning, falling back to defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    for path in config_search_paths().iter().filter(|p| p.is_file()) {
        match load_config(path) {
            Ok(config) => return Ok(config),
            Err(e) => warn!("Error loading config from {}: {:#}", path.display(), e),
        }
    }

    Ok(Config::default())
}

fn is_toml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}
