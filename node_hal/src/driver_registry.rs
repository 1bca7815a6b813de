//! Driver registry.
//!
//! Maps a device to its driver table by category and chip name. Constructed
//! at startup, populated via `register()`, and handed to the `Ledger` by
//! value. No global state.

use crate::driver::DeviceOps;
use node_common::device::{DeviceObject, DeviceType};
use std::collections::HashMap;

/// Registry of driver tables, partitioned by device category.
pub struct DriverRegistry {
    tables: HashMap<DeviceType, Vec<&'static DeviceOps>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver table under its own category.
    ///
    /// # Panics
    /// Panics if a table with the same category and name (ignoring case) is
    /// already registered.
    pub fn register(&mut self, ops: &'static DeviceOps) {
        let partition = self.tables.entry(ops.device_type).or_default();
        if partition.iter().any(|t| t.name.eq_ignore_ascii_case(ops.name)) {
            panic!("Driver '{}' is already registered", ops.name);
        }
        partition.push(ops);
    }

    /// Driver table for a device, by category and chip name.
    pub fn lookup(&self, obj: &DeviceObject) -> Option<&'static DeviceOps> {
        self.tables
            .get(&obj.device_type)?
            .iter()
            .copied()
            .find(|t| t.name.eq_ignore_ascii_case(&obj.name))
    }

    /// Names of the tables registered for a category.
    pub fn list_drivers(&self, device_type: DeviceType) -> Vec<&'static str> {
        self.tables
            .get(&device_type)
            .map(|p| p.iter().map(|t| t.name).collect())
            .unwrap_or_default()
    }

    /// Total number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Whether no table is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for ty in DeviceType::ALL {
            if let Some(partition) = self.tables.get(&ty) {
                map.entry(&ty, &partition.iter().map(|t| t.name).collect::<Vec<_>>());
            }
        }
        map.finish()
    }
}
