//! External property tables.
//!
//! Drivers ask the loader for a device's table first and fall back to
//! their compiled-in table when it has none.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "devices": [{
//!     "name": "TMP464",
//!     "version": "1.0",
//!     "properties": [{
//!       "name": "T1 HIGH LIMIT ALERT",
//!       "data_type": "TYPE_BOOL",
//!       "perm": "PERM_RD",
//!       "available": "PROP_AVAIL",
//!       "prop_type": "PROP_TYPE_ALERT",
//!       "units": "NA",
//!       "sysfs_file": "temp1_max_alarm",
//!       "dependent": {
//!         "curr_prop_id": 0,
//!         "lmt_prop_id": 2,
//!         "alert_condition": "GREATERTHENEQUALTO"
//!       }
//!     }]
//!   }]
//! }
//! ```

use node_common::config::ConfigError;
use node_common::property::{
    self, Dependency, Property, PropertyParseError, PropertyTable, parse_availability,
    parse_category, parse_comparison, parse_data_type, parse_permission,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Supplies property tables by device-type name.
pub trait PropertyLoader: Send + Sync {
    /// Number of properties for `name`.
    fn property_count(&self, name: &str) -> Option<usize>;

    /// Property table for `name`.
    fn property_table(&self, name: &str) -> Option<PropertyTable>;
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    name: String,
    #[serde(default)]
    version: Option<String>,
    properties: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    name: String,
    data_type: String,
    perm: String,
    #[serde(default = "default_available")]
    available: String,
    prop_type: String,
    #[serde(default)]
    units: String,
    sysfs_file: String,
    #[serde(default)]
    dependent: Option<RawDependency>,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    curr_prop_id: usize,
    lmt_prop_id: usize,
    alert_condition: String,
}

fn default_available() -> String {
    "AVAILABLE".to_string()
}

impl RawProperty {
    fn into_property(self) -> Result<Property, PropertyParseError> {
        let dependency = self
            .dependent
            .map(|dep| {
                Ok::<_, PropertyParseError>(Dependency {
                    current_index: dep.curr_prop_id,
                    limit_index: dep.lmt_prop_id,
                    comparison: parse_comparison(&dep.alert_condition)?,
                })
            })
            .transpose()?;
        Ok(Property {
            name: self.name,
            data_type: parse_data_type(&self.data_type)?,
            permission: parse_permission(&self.perm)?,
            availability: parse_availability(&self.available)?,
            category: parse_category(&self.prop_type)?,
            units: self.units,
            attr_suffix: self.sysfs_file,
            dependency,
        })
    }
}

fn build_table(device: RawDevice) -> Result<PropertyTable, String> {
    let table = device
        .properties
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            raw.into_property()
                .map_err(|e| format!("property {idx}: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    property::validate_table(&table)?;
    Ok(table.into())
}

/// Property tables parsed from a JSON document.
#[derive(Debug, Default)]
pub struct JsonPropertyLoader {
    tables: HashMap<String, PropertyTable>,
}

impl JsonPropertyLoader {
    /// Parse a JSON document.
    ///
    /// Device entries whose properties fail to parse, or whose alert
    /// dependencies point at unavailable properties, are logged and
    /// skipped so the driver falls back to its built-in table.
    ///
    /// # Errors
    /// `ConfigError::ParseError` if the document itself is malformed.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let doc: RawDocument =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let mut tables = HashMap::new();
        for device in doc.devices {
            let name = device.name.to_ascii_uppercase();
            let version = device.version.clone().unwrap_or_default();
            match build_table(device) {
                Ok(table) => {
                    debug!(
                        "Loaded {} properties for {} (version '{}')",
                        table.len(),
                        name,
                        version
                    );
                    tables.insert(name, table);
                }
                Err(e) => error!("Rejected property table for {}: {}", name, e),
            }
        }
        Ok(Self { tables })
    }

    /// Load a JSON property file.
    ///
    /// # Errors
    /// `ConfigError::FileNotFound` or `ConfigError::ParseError`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        let loader = Self::from_json(&content)?;
        info!(
            "Loaded property tables for {} device type(s) from {:?}",
            loader.tables.len(),
            path
        );
        Ok(loader)
    }

    /// Device-type names with a table.
    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

impl PropertyLoader for JsonPropertyLoader {
    fn property_count(&self, name: &str) -> Option<usize> {
        self.property_table(name).map(|t| t.len())
    }

    fn property_table(&self, name: &str) -> Option<PropertyTable> {
        self.tables.get(&name.to_ascii_uppercase()).cloned()
    }
}
