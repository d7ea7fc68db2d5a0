//! Configuration loading traits and types.
//!
//! Node runtime configuration is TOML, loaded through [`ConfigLoader`].
//! Machine settings (workpiece order, calibration) live in a separate
//! `KEY=VALUE` file handled by [`crate::settings`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use sorter_common::config::{ConfigLoader, ConfigError, NodeConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = NodeConfig::load(Path::new("node.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::{
    DEFAULT_SERVICE_DIR, DEFAULT_SETTINGS_FILE, WD_CHECK_INTERVAL_MS, WD_SEND_INTERVAL_MS,
    WD_TIMEOUT_MS,
};
use crate::role::Role;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// Parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Writing a default configuration file failed.
    #[error("Failed to write configuration: {0}")]
    WriteError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across node processes.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "sorter-node-1"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Node identity and file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    /// Master or slave.
    #[serde(default)]
    pub role: Role,

    /// Whether this belt has a pusher instead of a switch.
    #[serde(default)]
    pub pusher_mounted: bool,

    /// Directory holding both nodes' service endpoints.
    #[serde(default = "default_service_dir")]
    pub service_dir: PathBuf,

    /// Machine settings file (`KEY=VALUE`).
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            role: Role::default(),
            pusher_mounted: false,
            service_dir: default_service_dir(),
            settings_file: default_settings_file(),
        }
    }
}

fn default_service_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SERVICE_DIR)
}

fn default_settings_file() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}

/// Heartbeat timing.
///
/// # TOML Example
///
/// ```toml
/// [watchdog]
/// send_interval_ms = 2000
/// check_interval_ms = 1000
/// timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub send_interval_ms: u64,
    pub check_interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: WD_SEND_INTERVAL_MS,
            check_interval_ms: WD_CHECK_INTERVAL_MS,
            timeout_ms: WD_TIMEOUT_MS,
        }
    }
}

impl WatchdogConfig {
    #[inline]
    pub const fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    #[inline]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    #[inline]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the timing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if any interval is zero or the
    /// timeout does not exceed the send interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_interval_ms == 0 || self.check_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "watchdog intervals must be non-zero".to_string(),
            ));
        }
        if self.timeout_ms <= self.send_interval_ms {
            return Err(ConfigError::ValidationError(format!(
                "watchdog timeout_ms ({}) must exceed send_interval_ms ({})",
                self.timeout_ms, self.send_interval_ms
            )));
        }
        Ok(())
    }
}

/// Complete node configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "sorter-master"
///
/// [node]
/// role = "master"
/// service_dir = "/tmp/sorter"
///
/// [watchdog]
/// timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

impl NodeConfig {
    /// Configuration used when no file is given.
    pub fn with_role(role: Role) -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: format!("sorter-{role}"),
            },
            node: NodeSection {
                role,
                ..NodeSection::default()
            },
            watchdog: WatchdogConfig::default(),
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.watchdog.validate()?;
        if self.node.service_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "node.service_dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Default implementation works with any type implementing
/// `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
