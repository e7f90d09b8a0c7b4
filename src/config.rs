//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ClientConfig;
use crate::notification::Timings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,

    #[serde(default = "default_verification_timeout")]
    pub verification_timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::api::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_login_timeout() -> u64 {
    10
}

fn default_verification_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            login_timeout_secs: default_login_timeout(),
            verification_timeout_secs: default_verification_timeout(),
        }
    }
}

impl ApiConfig {
    /// Client configuration derived from this section
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_ms: self.request_timeout_secs.saturating_mul(1000),
            login_timeout_ms: self.login_timeout_secs.saturating_mul(1000),
            verification_timeout_ms: self.verification_timeout_secs.saturating_mul(1000),
        }
    }
}

/// Upper bound for any configured API timeout
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Notification exit transition configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_exit_delay")]
    pub exit_delay_ms: u64,

    #[serde(default = "default_exit_transition")]
    pub exit_transition_ms: u64,
}

fn default_exit_delay() -> u64 {
    400
}

fn default_exit_transition() -> u64 {
    500
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            exit_delay_ms: default_exit_delay(),
            exit_transition_ms: default_exit_transition(),
        }
    }
}

impl NotificationConfig {
    pub fn timings(&self) -> Timings {
        Timings::new(
            Duration::from_millis(self.exit_delay_ms),
            Duration::from_millis(self.exit_transition_ms),
        )
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("clinic-portal").to_string_lossy().to_string())
        .unwrap_or_else(|| "./clinic_portal_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~/` expanded
    pub fn path(&self) -> PathBuf {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.data_dir)),
            None => PathBuf::from(&self.data_dir),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("clinic-portal").join("config.toml")),
            Some(PathBuf::from("/etc/clinic-portal/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Reject settings the notification and client layers cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = &self.notifications;
        if n.exit_delay_ms == 0 || n.exit_transition_ms == 0 {
            return Err(ConfigError::Invalid(
                "notification timings must be positive".to_string(),
            ));
        }
        if n.exit_delay_ms >= n.exit_transition_ms {
            return Err(ConfigError::Invalid(format!(
                "exit_delay_ms ({}) must be shorter than exit_transition_ms ({})",
                n.exit_delay_ms, n.exit_transition_ms
            )));
        }

        let a = &self.api;
        if a.request_timeout_secs == 0 || a.login_timeout_secs == 0 || a.verification_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        let longest = a
            .request_timeout_secs
            .max(a.login_timeout_secs)
            .max(a.verification_timeout_secs);
        if longest > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "timeouts must not exceed {} seconds (got {})",
                MAX_TIMEOUT_SECS, longest
            )));
        }
        if a.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".to_string()));
        }

        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CLINIC_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(data_dir) = std::env::var("CLINIC_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Ok(level) = std::env::var("CLINIC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CLINIC_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Clinic Portal Configuration
#
# Environment variables override these settings:
# - CLINIC_API_URL
# - CLINIC_DATA_DIR
# - CLINIC_LOG_LEVEL
# - CLINIC_LOG_FORMAT

[api]
# Clinic backend origin
base_url = "https://back-end-4803.onrender.com"

# Deadline for ordinary requests (seconds)
request_timeout_secs = 30

# Deadline for the login request (seconds)
login_timeout_secs = 10

# Deadline for verification-code requests (seconds)
verification_timeout_secs = 15

[notifications]
# Delay between hiding a notification and reporting it closed (ms)
exit_delay_ms = 400

# Length of the exit transition (ms); must be longer than exit_delay_ms
exit_transition_ms = 500

[storage]
# Directory holding the remembered session
data_dir = "~/.local/share/clinic-portal"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/clinic-portal/portal.log"
"#
    .to_string()
}
