//! Node Common Library
//!
//! Shared types for the node hardware abstraction layer: device identity,
//! the static property model, typed attribute values, alert payloads,
//! the error taxonomy and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`device`] - Device identity (`DeviceObject`) and module descriptors
//! - [`property`] - Property model and its string parsers
//! - [`value`] - Typed attribute values
//! - [`alert`] - Alert states and callback payloads
//! - [`error`] - Ledger and attribute error kinds
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Shared constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use node_common::prelude::*;
//!
//! let a = DeviceObject::new("ComV1", "TMP464", "PA temp", DeviceType::Temperature);
//! let b = DeviceObject::new("comv1", "tmp464", "pa TEMP", DeviceType::Temperature);
//! assert_eq!(a, b);
//! ```

pub mod alert;
pub mod config;
pub mod consts;
pub mod device;
pub mod error;
pub mod prelude;
pub mod property;
pub mod value;
