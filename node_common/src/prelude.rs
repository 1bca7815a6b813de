//! Prelude module for common re-exports.
//!
//! ```rust
//! use node_common::prelude::*;
//! ```

// ─── Identity ───────────────────────────────────────────────────────
pub use crate::device::{DeviceDescriptor, DeviceObject, DeviceType, HwConfig};

// ─── Property Model ─────────────────────────────────────────────────
pub use crate::property::{
    Availability, Comparison, DataType, Dependency, Permission, Property, PropertyCategory,
    PropertyTable,
};
pub use crate::value::Value;

// ─── Alerts ─────────────────────────────────────────────────────────
pub use crate::alert::{AlertCallbackData, AlertState};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{AttrError, LedgerError};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, NodeConfig, SharedConfig};
