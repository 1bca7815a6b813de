//! Registered device value.

use crate::driver::DeviceOps;
use crate::irq::IrqCallback;
use node_common::alert::AlertCallbackData;
use node_common::device::{DeviceDescriptor, DeviceObject, HwConfig};
use node_common::property::{Property, PropertyTable};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Application callback receiving a batch of alert events for one device.
pub type AppCallback = Arc<dyn Fn(&DeviceObject, &[AlertCallbackData]) + Send + Sync>;

/// A device as stored in the ledger.
///
/// Cloning is cheap: the property table and callbacks are shared.
#[derive(Clone)]
pub struct Device {
    /// Identity
    pub obj: DeviceObject,
    /// Attribute directory for sysfs-backed devices
    pub attr_path: Option<PathBuf>,
    /// Hardware configuration blob for devices without an attribute directory
    pub hw_config: Option<HwConfig>,
    /// Bound driver table, set once on registration
    pub driver: Option<&'static DeviceOps>,
    /// Property table loaded by the driver's `init`
    pub properties: Option<PropertyTable>,
    /// Ledger route for fired interrupts, installed by the driver
    pub irq_route: Option<IrqCallback>,
    /// Application callback
    pub callback: Option<AppCallback>,
}

impl Device {
    /// Build an unbound device from a module descriptor.
    ///
    /// A `hw` blob that does not fit the device type is dropped.
    pub fn from_descriptor(module_id: &str, desc: &DeviceDescriptor) -> Self {
        let obj = desc.object(module_id);
        let hw_config = desc.hw.filter(|hw| {
            let fits = hw.fits(obj.device_type);
            if !fits {
                warn!("Ignoring hw config {:?} for {}", hw, obj);
            }
            fits
        });
        Self {
            attr_path: desc
                .attr_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            hw_config,
            ..Self::probe(obj)
        }
    }

    /// Lookup key carrying only an identity.
    pub fn probe(obj: DeviceObject) -> Self {
        Self {
            obj,
            attr_path: None,
            hw_config: None,
            driver: None,
            properties: None,
            irq_route: None,
            callback: None,
        }
    }

    /// Properties loaded for this device (empty before `init`).
    pub fn property_table(&self) -> &[Property] {
        self.properties.as_deref().unwrap_or(&[])
    }

    /// Name of the bound driver, or the chip name when unbound.
    pub fn driver_name(&self) -> &str {
        self.driver.map_or(self.obj.name.as_str(), |ops| ops.name)
    }
}

/// Ledger equality: identity only.
pub fn same_device(a: &Device, b: &Device) -> bool {
    a.obj == b.obj
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("obj", &self.obj)
            .field("attr_path", &self.attr_path)
            .field("hw_config", &self.hw_config)
            .field("driver", &self.driver.map(|d| d.name))
            .field("properties", &self.property_table().len())
            .field("irq_route", &self.irq_route.is_some())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
