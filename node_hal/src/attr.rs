//! Attribute accessors.
//!
//! Device values live in text attribute files (sysfs). The accessor is the
//! only place that touches them; everything above works with typed
//! [`Value`]s.

use node_common::error::AttrError;
use node_common::property::{DataType, Property};
use node_common::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Typed access to attribute files.
pub trait AttributeAccessor: Send + Sync {
    /// Whether the attribute exists.
    fn exists(&self, path: &Path) -> bool;

    /// Read the attribute and interpret it as `data_type`.
    fn read_typed(&self, path: &Path, data_type: DataType) -> Result<Value, AttrError>;

    /// Write `value` to the attribute as `data_type` text.
    fn write_typed(&self, path: &Path, data_type: DataType, value: &Value)
        -> Result<(), AttrError>;
}

fn decode(path: &Path, text: &str, data_type: DataType) -> Result<Value, AttrError> {
    Value::parse(text, data_type).ok_or_else(|| AttrError::Parse {
        path: path.to_path_buf(),
        text: text.trim().to_string(),
        data_type,
    })
}

fn encode(data_type: DataType, value: &Value) -> Result<String, AttrError> {
    value
        .to_attr_string()
        .ok_or(AttrError::Unrepresentable { data_type })
}

fn io_error(path: &Path, err: io::Error) -> AttrError {
    if err.kind() == io::ErrorKind::NotFound {
        AttrError::NotFound(path.to_path_buf())
    } else {
        AttrError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

// ─── SysfsAccessor ──────────────────────────────────────────────────

/// Accessor over real attribute files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysfsAccessor;

impl AttributeAccessor for SysfsAccessor {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_typed(&self, path: &Path, data_type: DataType) -> Result<Value, AttrError> {
        let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        decode(path, &text, data_type)
    }

    fn write_typed(
        &self,
        path: &Path,
        data_type: DataType,
        value: &Value,
    ) -> Result<(), AttrError> {
        let text = encode(data_type, value)?;
        fs::write(path, text).map_err(|e| io_error(path, e))
    }
}

// ─── SimulatedAttributes ────────────────────────────────────────────

/// In-memory attribute store for simulation mode and tests.
#[derive(Debug, Default)]
pub struct SimulatedAttributes {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl SimulatedAttributes {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw text of an attribute, creating it if needed.
    pub fn set(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.write().insert(path.into(), text.into());
    }

    /// Raw text of an attribute.
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().get(path).cloned()
    }

    /// Remove an attribute.
    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.write().remove(path)
    }

    /// Create every available property of a device under `base` with its
    /// zero value. Existing attributes are left untouched.
    pub fn seed_device(&self, base: &Path, properties: &[Property]) -> usize {
        let mut files = self.files.write();
        let mut created = 0;
        for prop in properties.iter().filter(|p| p.is_available()) {
            let text = Value::zero(prop.data_type)
                .to_attr_string()
                .unwrap_or_default();
            files.entry(base.join(&prop.attr_suffix)).or_insert_with(|| {
                created += 1;
                text
            });
        }
        created
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl AttributeAccessor for SimulatedAttributes {
    /// Attributes exist; so does any directory holding one.
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.read();
        files.contains_key(path) || files.keys().any(|p| p.starts_with(path))
    }

    fn read_typed(&self, path: &Path, data_type: DataType) -> Result<Value, AttrError> {
        let files = self.files.read();
        let text = files
            .get(path)
            .ok_or_else(|| AttrError::NotFound(path.to_path_buf()))?;
        decode(path, text, data_type)
    }

    fn write_typed(
        &self,
        path: &Path,
        data_type: DataType,
        value: &Value,
    ) -> Result<(), AttrError> {
        let text = encode(data_type, value)?;
        let mut files = self.files.write();
        let slot = files
            .get_mut(path)
            .ok_or_else(|| AttrError::NotFound(path.to_path_buf()))?;
        *slot = text;
        Ok(())
    }
}
