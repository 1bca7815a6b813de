//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for the node HAL.
//!
//! # Usage
//!
//! ```rust,no_run
//! use node_common::config::{ConfigLoader, NodeConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = NodeConfig::load(Path::new("ledger.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{DEFAULT_IRQ_POLL_MS, MAX_IRQ_POLL_MS};
use crate::device::DeviceDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML (or JSON) parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
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
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "node-hal-01"
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

/// Signal-wait primitive used by interrupt monitor threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IrqBackend {
    /// `poll(2)` for `POLLPRI` on sysfs attributes (`sysfs_notify`).
    #[default]
    SysfsNotify,
    /// File-change watch on regular attribute files.
    FileWatch,
    /// In-process triggers (simulation and tests).
    Simulated,
}

fn default_irq_poll_ms() -> u64 {
    DEFAULT_IRQ_POLL_MS
}

/// Ledger settings (`[ledger]` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerSettings {
    /// JSON property tables overriding the built-in ones.
    #[serde(default)]
    pub property_file: Option<PathBuf>,

    /// Interrupt signal backend.
    #[serde(default)]
    pub irq_backend: IrqBackend,

    /// Interval at which monitor threads observe cancellation [ms].
    #[serde(default = "default_irq_poll_ms")]
    pub irq_poll_ms: u64,

    /// Arm every available alert property after registration.
    #[serde(default)]
    pub enable_alerts: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            property_file: None,
            irq_backend: IrqBackend::default(),
            irq_poll_ms: DEFAULT_IRQ_POLL_MS,
            enable_alerts: false,
        }
    }
}

/// Devices discovered on one hardware module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Module identifier (e.g. board UUID)
    pub module_id: String,
    /// Device descriptors, registered in order
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
}

/// Top-level node HAL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Shared settings
    pub shared: SharedConfig,
    /// Ledger settings
    #[serde(default)]
    pub ledger: LedgerSettings,
    /// Modules and their devices
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl NodeConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - `irq_poll_ms` is outside `1..=60000`
    /// - a module id or device name is empty
    /// - a device's `hw` blob does not fit its device type
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if !(1..=MAX_IRQ_POLL_MS).contains(&self.ledger.irq_poll_ms) {
            return Err(ConfigError::ValidationError(format!(
                "irq_poll_ms must be within 1..={MAX_IRQ_POLL_MS}, got {}",
                self.ledger.irq_poll_ms
            )));
        }

        for module in &self.modules {
            if module.module_id.is_empty() {
                return Err(ConfigError::ValidationError(
                    "module_id cannot be empty".to_string(),
                ));
            }
            for dev in &module.devices {
                if dev.name.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "module '{}': device name cannot be empty",
                        module.module_id
                    )));
                }
                if let Some(hw) = &dev.hw {
                    if !hw.fits(dev.device_type) {
                        return Err(ConfigError::ValidationError(format!(
                            "module '{}': hw config {:?} does not fit {} device '{}'",
                            module.module_id, hw, dev.device_type, dev.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Total number of device descriptors across modules.
    pub fn device_count(&self) -> usize {
        self.modules.iter().map(|m| m.devices.len()).sum()
    }
}

/// Trait for loading configuration from TOML files.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceType, HwConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
            assert_eq!(level.as_directive(), text);
        }
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = NodeConfig::load(Path::new("/nonexistent/path/ledger.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = NodeConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_node_config_defaults() {
        let config: NodeConfig = toml::from_str(
            r#"
[shared]
service_name = "node-hal"
"#,
        )
        .unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Info);
        assert_eq!(config.ledger.irq_backend, IrqBackend::SysfsNotify);
        assert_eq!(config.ledger.irq_poll_ms, DEFAULT_IRQ_POLL_MS);
        assert!(!config.ledger.enable_alerts);
        assert!(config.modules.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_node_config_modules() {
        let config: NodeConfig = toml::from_str(
            r#"
[shared]
service_name = "node-hal"

[ledger]
irq_backend = "file_watch"
irq_poll_ms = 50
enable_alerts = true

[[modules]]
module_id = "ComV1"

[[modules.devices]]
name = "TMP464"
description = "PA temperature"
device_type = "tmp"
attr_path = "/sys/class/hwmon/hwmon0/"
hw = { bus = 1, address = 72 }

[[modules.devices]]
name = "GPIO"
description = "PG line"
device_type = "gpio"
hw = { gpio = 38 }
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.ledger.irq_backend, IrqBackend::FileWatch);
        assert_eq!(config.device_count(), 2);
        let dev = &config.modules[0].devices[0];
        assert_eq!(dev.device_type, DeviceType::Temperature);
        assert!(matches!(dev.hw, Some(HwConfig::I2c(_))));
    }

    #[test]
    fn test_node_config_rejects_mismatched_hw() {
        let config: NodeConfig = toml::from_str(
            r#"
[shared]
service_name = "node-hal"

[[modules]]
module_id = "ComV1"

[[modules.devices]]
name = "INA226"
device_type = "power"
hw = { gpio = 4 }
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("INA226"));
    }

    #[test]
    fn test_node_config_rejects_zero_poll() {
        let mut config: NodeConfig = toml::from_str(
            r#"
[shared]
service_name = "node-hal"
"#,
        )
        .unwrap();
        config.ledger.irq_poll_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
