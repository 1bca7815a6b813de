//! # Node HAL Library
//!
//! Device ledger and interrupt dispatch for an embedded node.
//!
//! Sensors and actuators found on a board are registered in the [`ledger`],
//! bound to a static driver table ([`driver::DeviceOps`]) and accessed
//! through a uniform configure/read/write/enable/disable contract. Alert
//! attributes can be armed; each armed attribute gets its own monitor
//! thread, and fired alerts are re-checked against their thresholds before
//! reaching the application callback.
//!
//! # Module Structure
//!
//! - [`ledger`] - Device registry and the public operation set
//! - [`driver`] - Driver-function tables and the driver environment
//! - [`driver_registry`] - Table lookup by category and chip name
//! - [`drivers`] - Built-in chip drivers
//! - [`dispatch`] - Availability gate and attribute resolution
//! - [`alert`] - Alert evaluation
//! - [`irq`] - Interrupt registry and signal-line backends
//! - [`attr`] - Attribute accessors
//! - [`property_loader`] - External JSON property tables
//! - [`device`] - Registered device value
//! - [`list`] - Container with injected equality
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          node_hal                                   │
//! │  ┌────────────┐    ┌──────────────┐    ┌──────────────────────┐     │
//! │  │  callers   │───►│    Ledger    │───►│  Driver Registry     │     │
//! │  └────────────┘    │ (partitions) │    └──────────────────────┘     │
//! │        ▲           └──────┬───────┘                                 │
//! │        │                  │ dispatch                                │
//! │        │                  ▼                                         │
//! │        │           ┌──────────────┐    ┌──────────────────────┐     │
//! │        │           │  DeviceOps   │───►│ AttributeAccessor    │     │
//! │        │           └──────┬───────┘    └──────────────────────┘     │
//! │        │                  │ enable_irq                              │
//! │        │                  ▼                                         │
//! │        │           ┌──────────────┐    ┌──────────────────────┐     │
//! │        └───────────│  IRQ routes  │◄───│ Interrupt Registry   │     │
//! │     app callback   │ + evaluator  │    │ (monitor threads)    │     │
//! │                    └──────────────┘    └──────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod alert;
pub mod attr;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod driver_registry;
pub mod drivers;
pub mod irq;
pub mod ledger;
pub mod list;
pub mod property_loader;

// Re-export key types for convenience
pub use crate::attr::{AttributeAccessor, SimulatedAttributes, SysfsAccessor};
pub use crate::device::{AppCallback, Device};
pub use crate::driver::{DeviceOps, DriverEnv};
pub use crate::driver_registry::DriverRegistry;
pub use crate::irq::{InterruptRegistry, IrqSource, SignalLines, SimulatedLines};
pub use crate::ledger::{Ledger, LedgerContext, RegistrationReport};
pub use crate::property_loader::{JsonPropertyLoader, PropertyLoader};
