//! Ledger configuration file tests.
//!
//! Loads `ledger.toml` files from disk through `ConfigLoader`: the shipped
//! sample, minimal files, unknown fields and semantic validation.

use node_common::config::{ConfigError, ConfigLoader, IrqBackend, LogLevel, NodeConfig};
use node_common::device::{DeviceType, GpioConfig, GpioDirection, HwConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_ledger_toml(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("ledger.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_sample_config_loads_and_validates() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/ledger.toml");
    let config = NodeConfig::load(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.shared.service_name, "node-hal-01");
    assert_eq!(config.ledger.irq_backend, IrqBackend::SysfsNotify);
    assert!(config.ledger.enable_alerts);
    assert_eq!(config.modules.len(), 1);
    assert_eq!(config.device_count(), 6);

    let types: Vec<DeviceType> = config.modules[0]
        .devices
        .iter()
        .map(|d| d.device_type)
        .collect();
    assert_eq!(types, DeviceType::ALL.to_vec());

    let gpio = &config.modules[0].devices[4];
    assert_eq!(gpio.attr_path, None);
    assert_eq!(
        gpio.hw,
        Some(HwConfig::Gpio(GpioConfig {
            gpio: 38,
            direction: GpioDirection::In,
        }))
    );
}

#[test]
fn test_minimal_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_ledger_toml(
        tmp.path(),
        r#"
[shared]
log_level = "debug"
service_name = "bench"
"#,
    );
    let config = NodeConfig::load(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.device_count(), 0);
    assert_eq!(config.ledger.property_file, None);
}

#[test]
fn test_property_file_path() {
    let tmp = TempDir::new().unwrap();
    let path = write_ledger_toml(
        tmp.path(),
        r#"
[shared]
service_name = "bench"

[ledger]
property_file = "/etc/node/properties.json"
irq_backend = "simulated"
"#,
    );
    let config = NodeConfig::load(&path).unwrap();
    assert_eq!(
        config.ledger.property_file,
        Some(PathBuf::from("/etc/node/properties.json"))
    );
    assert_eq!(config.ledger.irq_backend, IrqBackend::Simulated);
}

#[test]
fn test_unknown_ledger_field_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write_ledger_toml(
        tmp.path(),
        r#"
[shared]
service_name = "bench"

[ledger]
irq_threads = 4
"#,
    );
    let err = NodeConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(ref msg) if msg.contains("irq_threads")));
}

#[test]
fn test_unknown_device_type_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write_ledger_toml(
        tmp.path(),
        r#"
[shared]
service_name = "bench"

[[modules]]
module_id = "ComV1"

[[modules.devices]]
name = "BME280"
device_type = "humidity"
"#,
    );
    assert!(matches!(
        NodeConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_empty_module_id_fails_validation() {
    let tmp = TempDir::new().unwrap();
    let path = write_ledger_toml(
        tmp.path(),
        r#"
[shared]
service_name = "bench"

[[modules]]
module_id = ""
"#,
    );
    let config = NodeConfig::load(&path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(ref msg)) if msg.contains("module_id")
    ));
}

#[test]
fn test_poll_interval_upper_bound() {
    let tmp = TempDir::new().unwrap();
    let path = write_ledger_toml(
        tmp.path(),
        r#"
[shared]
service_name = "bench"

[ledger]
irq_poll_ms = 60001
"#,
    );
    let config = NodeConfig::load(&path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
