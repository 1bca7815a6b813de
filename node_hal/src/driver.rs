//! Driver-function tables.
//!
//! A [`DeviceOps`] is a static table of optional operation slots. An absent
//! slot means the capability is not supported by that chip; callers get
//! `ApiNotSupported`. Tables are `'static` and shared by every device bound
//! to them.

use crate::attr::AttributeAccessor;
use crate::device::Device;
use crate::dispatch::Request;
use crate::irq::{InterruptRegistry, IrqCallback};
use crate::property_loader::PropertyLoader;
use node_common::alert::{AlertCallbackData, AlertState};
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::PropertyTable;
use node_common::value::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Bind the device: load its property table and prepare hardware.
pub type InitFn = fn(&DriverEnv, &mut Device) -> Result<(), LedgerError>;
/// Driver-level registration of an initialized device.
pub type RegistrationFn = fn(&DriverEnv, &Device) -> Result<(), LedgerError>;
/// Number of properties of the bound table.
pub type PropCountFn = fn(&Device) -> Result<usize, LedgerError>;
/// The bound property table.
pub type PropsFn = fn(&Device) -> Result<PropertyTable, LedgerError>;
/// `configure` / `write`.
pub type ApplyFn = fn(&DriverEnv, &Device, &Request<'_>, &Value) -> Result<(), LedgerError>;
/// `read`.
pub type ReadFn = fn(&DriverEnv, &Device, &Request<'_>) -> Result<Value, LedgerError>;
/// `enable` / `disable` / `enable_irq` / `disable_irq`.
pub type ActionFn = fn(&DriverEnv, &Device, &Request<'_>) -> Result<(), LedgerError>;
/// Install the ledger's interrupt route on a device.
pub type RegisterCallbackFn = fn(&mut Device, IrqCallback) -> Result<(), LedgerError>;
/// Remove the interrupt route.
pub type DeregisterCallbackFn = fn(&mut Device) -> Result<(), LedgerError>;
/// Evaluate a fired attribute into alert events.
pub type ConfirmIrqFn =
    fn(&DriverEnv, &Device, &Path) -> Result<Vec<AlertCallbackData>, LedgerError>;
/// Alert state code of a confirmed alert property.
pub type IrqTypeFn = fn(usize) -> Option<AlertState>;

/// Operation table of one chip.
pub struct DeviceOps {
    /// Chip name matched against `DeviceObject::name`
    pub name: &'static str,
    /// Partition the table is registered in
    pub device_type: DeviceType,
    /// Load properties and bind
    pub init: Option<InitFn>,
    /// Driver-level registration
    pub registration: Option<RegistrationFn>,
    /// Property count
    pub read_prop_count: Option<PropCountFn>,
    /// Property table
    pub read_props: Option<PropsFn>,
    /// Write a config property
    pub configure: Option<ApplyFn>,
    /// Read a property
    pub read: Option<ReadFn>,
    /// Write a property
    pub write: Option<ApplyFn>,
    /// Enable a property
    pub enable: Option<ActionFn>,
    /// Disable a property
    pub disable: Option<ActionFn>,
    /// Install interrupt route
    pub register_callback: Option<RegisterCallbackFn>,
    /// Remove interrupt route
    pub deregister_callback: Option<DeregisterCallbackFn>,
    /// Start monitoring an alert property
    pub enable_irq: Option<ActionFn>,
    /// Stop monitoring an alert property
    pub disable_irq: Option<ActionFn>,
    /// Classify a fired attribute
    pub confirm_irq: Option<ConfirmIrqFn>,
    /// Alert state per alert property
    pub irq_type: Option<IrqTypeFn>,
}

impl DeviceOps {
    /// A table with every slot absent.
    pub const fn empty(name: &'static str, device_type: DeviceType) -> Self {
        Self {
            name,
            device_type,
            init: None,
            registration: None,
            read_prop_count: None,
            read_props: None,
            configure: None,
            read: None,
            write: None,
            enable: None,
            disable: None,
            register_callback: None,
            deregister_callback: None,
            enable_irq: None,
            disable_irq: None,
            confirm_irq: None,
            irq_type: None,
        }
    }

    /// Names of the populated slots.
    pub fn supported(&self) -> Vec<&'static str> {
        [
            ("init", self.init.is_some()),
            ("registration", self.registration.is_some()),
            ("read_prop_count", self.read_prop_count.is_some()),
            ("read_props", self.read_props.is_some()),
            ("configure", self.configure.is_some()),
            ("read", self.read.is_some()),
            ("write", self.write.is_some()),
            ("enable", self.enable.is_some()),
            ("disable", self.disable.is_some()),
            ("register_callback", self.register_callback.is_some()),
            ("deregister_callback", self.deregister_callback.is_some()),
            ("enable_irq", self.enable_irq.is_some()),
            ("disable_irq", self.disable_irq.is_some()),
            ("confirm_irq", self.confirm_irq.is_some()),
            ("irq_type", self.irq_type.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

impl fmt::Debug for DeviceOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceOps")
            .field("name", &self.name)
            .field("device_type", &self.device_type)
            .field("supported", &self.supported())
            .finish()
    }
}

/// Collaborators handed to every driver slot.
#[derive(Clone)]
pub struct DriverEnv {
    /// Attribute accessor
    pub attrs: Arc<dyn AttributeAccessor>,
    /// External property tables, if configured
    pub properties: Option<Arc<dyn PropertyLoader>>,
    /// Interrupt registry
    pub irqs: InterruptRegistry,
}

impl fmt::Debug for DriverEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverEnv")
            .field("properties", &self.properties.is_some())
            .field("irqs", &self.irqs.len())
            .finish_non_exhaustive()
    }
}
