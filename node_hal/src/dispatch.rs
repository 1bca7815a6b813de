//! Dispatch helper.
//!
//! Bridges a `(device, property index, payload)` request to the bound
//! driver table. Every entry point checks, in order:
//!
//! 1. the device has a bound table (`DriverMissing`),
//! 2. the table has the requested slot (`ApiNotSupported`),
//! 3. the property is available on this revision (`PropertyMissing`),
//! 4. the property resolves to an attribute target (`AttributeMissing`),
//!
//! and only then calls the slot. Values pass through untouched.

use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use crate::irq::{IrqKind, IrqSource, Registration};
use node_common::consts::GPIO_SYSFS_ROOT;
use node_common::device::HwConfig;
use node_common::error::LedgerError;
use node_common::property::{self, Property, PropertyTable};
use node_common::value::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Physical target of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Target<'a> {
    /// Device attribute directory joined with the property suffix
    Path(PathBuf),
    /// Opaque hardware configuration of a device without attribute directory
    Config(&'a HwConfig),
}

/// A resolved request handed to a driver slot.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    /// Property index
    pub index: usize,
    /// The property being addressed
    pub property: &'a Property,
    /// Where it lives
    pub target: Target<'a>,
}

impl Request<'_> {
    /// Attribute file backing the request, if the target has one.
    ///
    /// GPIO blobs address the legacy sysfs GPIO interface by line number.
    pub fn attribute(&self) -> Option<PathBuf> {
        match &self.target {
            Target::Path(path) => Some(path.clone()),
            Target::Config(HwConfig::Gpio(gpio)) => {
                Some(gpio_attribute(gpio.gpio, &self.property.attr_suffix))
            }
            Target::Config(_) => None,
        }
    }

    /// Interrupt source kind for this target.
    pub fn irq_kind(&self) -> IrqKind {
        match &self.target {
            Target::Config(HwConfig::Gpio(gpio)) => IrqKind::Line(gpio.gpio),
            _ => IrqKind::Sysfs,
        }
    }
}

/// `<GPIO_SYSFS_ROOT>/gpio<N>/<suffix>`
pub fn gpio_attribute(gpio: u32, suffix: &str) -> PathBuf {
    Path::new(GPIO_SYSFS_ROOT)
        .join(format!("gpio{gpio}"))
        .join(suffix)
}

/// Resolve property `index` of `dev` to its target.
///
/// # Errors
/// - `PropertyMissing` if the index is out of range or not available
/// - `AttributeMissing` if the device has neither an attribute directory
///   nor a hardware blob
pub fn resolve(dev: &Device, index: usize) -> Result<Request<'_>, LedgerError> {
    let table = dev.property_table();
    if !property::is_available(table, index) {
        return Err(LedgerError::PropertyMissing { index });
    }
    let property = &table[index];

    let target = if let Some(base) = &dev.attr_path {
        Target::Path(base.join(&property.attr_suffix))
    } else if let Some(hw) = &dev.hw_config {
        Target::Config(hw)
    } else {
        return Err(LedgerError::AttributeMissing { index });
    };

    Ok(Request {
        index,
        property,
        target,
    })
}

/// Attribute file of property `index`, or `AttributeMissing`.
pub fn attribute_path(dev: &Device, index: usize) -> Result<PathBuf, LedgerError> {
    resolve(dev, index)?
        .attribute()
        .ok_or(LedgerError::AttributeMissing { index })
}

fn bound(dev: &Device) -> Result<&'static DeviceOps, LedgerError> {
    dev.driver
        .ok_or_else(|| LedgerError::DriverMissing(dev.obj.to_string()))
}

fn slot<F>(
    dev: &Device,
    op: &'static str,
    pick: impl FnOnce(&'static DeviceOps) -> Option<F>,
) -> Result<F, LedgerError> {
    let ops = bound(dev)?;
    pick(ops).ok_or_else(|| LedgerError::ApiNotSupported {
        op,
        driver: ops.name.to_string(),
    })
}

// ─── Property operations ────────────────────────────────────────────

/// Number of properties exposed by the device's driver.
pub fn read_prop_count(dev: &Device) -> Result<usize, LedgerError> {
    slot(dev, "read_prop_count", |ops| ops.read_prop_count)?(dev)
}

/// Property table exposed by the device's driver.
pub fn read_props(dev: &Device) -> Result<PropertyTable, LedgerError> {
    slot(dev, "read_props", |ops| ops.read_props)?(dev)
}

/// Write a configuration property.
pub fn configure(
    env: &DriverEnv,
    dev: &Device,
    index: usize,
    value: &Value,
) -> Result<(), LedgerError> {
    let op = slot(dev, "configure", |ops| ops.configure)?;
    op(env, dev, &resolve(dev, index)?, value)
}

/// Read a property.
pub fn read(env: &DriverEnv, dev: &Device, index: usize) -> Result<Value, LedgerError> {
    let op = slot(dev, "read", |ops| ops.read)?;
    op(env, dev, &resolve(dev, index)?)
}

/// Write a property.
pub fn write(
    env: &DriverEnv,
    dev: &Device,
    index: usize,
    value: &Value,
) -> Result<(), LedgerError> {
    let op = slot(dev, "write", |ops| ops.write)?;
    op(env, dev, &resolve(dev, index)?, value)
}

/// Enable a property.
pub fn enable(env: &DriverEnv, dev: &Device, index: usize) -> Result<(), LedgerError> {
    let op = slot(dev, "enable", |ops| ops.enable)?;
    op(env, dev, &resolve(dev, index)?)
}

/// Disable a property.
pub fn disable(env: &DriverEnv, dev: &Device, index: usize) -> Result<(), LedgerError> {
    let op = slot(dev, "disable", |ops| ops.disable)?;
    op(env, dev, &resolve(dev, index)?)
}

// ─── Interrupts ─────────────────────────────────────────────────────

/// Start monitoring alert property `index`.
pub fn enable_irq(env: &DriverEnv, dev: &Device, index: usize) -> Result<(), LedgerError> {
    let op = slot(dev, "enable_irq", |ops| ops.enable_irq)?;
    op(env, dev, &resolve(dev, index)?)
}

/// Stop monitoring alert property `index`.
pub fn disable_irq(env: &DriverEnv, dev: &Device, index: usize) -> Result<(), LedgerError> {
    let op = slot(dev, "disable_irq", |ops| ops.disable_irq)?;
    op(env, dev, &resolve(dev, index)?)
}

/// Interrupt source descriptor for a resolved request.
pub fn irq_source(dev: &Device, req: &Request<'_>) -> Result<IrqSource, LedgerError> {
    let path = req
        .attribute()
        .ok_or(LedgerError::AttributeMissing { index: req.index })?;
    Ok(IrqSource {
        obj: dev.obj.clone(),
        path,
        kind: req.irq_kind(),
    })
}

/// Register the request's source with the interrupt registry, routing
/// fired signals through the device's installed route.
///
/// # Errors
/// - `InvalidPointer` if no route was installed on the device
/// - `ThreadCreateFailed` if the monitor could not be started
pub fn register_source(
    env: &DriverEnv,
    dev: &Device,
    req: &Request<'_>,
) -> Result<(), LedgerError> {
    let route = dev
        .irq_route
        .clone()
        .ok_or(LedgerError::InvalidPointer("irq route"))?;
    let source = irq_source(dev, req)?;
    if env.irqs.register(source, route)? == Registration::AlreadyRegistered {
        debug!("IRQ for {} property {} already active", dev.obj, req.index);
    }
    Ok(())
}

/// Deregister the request's source, joining its monitor thread.
pub fn deregister_source(
    env: &DriverEnv,
    dev: &Device,
    req: &Request<'_>,
) -> Result<(), LedgerError> {
    env.irqs.deregister(&irq_source(dev, req)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::SimulatedAttributes;
    use crate::irq::{InterruptRegistry, SimulatedLines};
    use node_common::device::{DeviceObject, DeviceType, GpioConfig, GpioDirection};
    use node_common::property::{DataType, Permission, PropertyCategory};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_read(
        _env: &DriverEnv,
        _dev: &Device,
        req: &Request<'_>,
    ) -> Result<Value, LedgerError> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(Value::U32(req.index as u32))
    }

    fn counting_apply(
        _env: &DriverEnv,
        _dev: &Device,
        _req: &Request<'_>,
        _value: &Value,
    ) -> Result<(), LedgerError> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn counting_action(
        _env: &DriverEnv,
        _dev: &Device,
        _req: &Request<'_>,
    ) -> Result<(), LedgerError> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    static COUNTING: DeviceOps = DeviceOps {
        configure: Some(counting_apply),
        read: Some(counting_read),
        write: Some(counting_apply),
        enable: Some(counting_action),
        disable: Some(counting_action),
        ..DeviceOps::empty("COUNTING", DeviceType::Led)
    };

    fn env() -> DriverEnv {
        DriverEnv {
            attrs: Arc::new(SimulatedAttributes::new()),
            properties: None,
            irqs: InterruptRegistry::new(Arc::new(SimulatedLines::new()), Duration::from_millis(5)),
        }
    }

    fn table() -> PropertyTable {
        vec![
            Property::new("RED", DataType::U32, Permission::READ | Permission::WRITE, PropertyCategory::Config, "NA", "red/brightness"),
            Property::new("BLINK", DataType::Bool, Permission::READ | Permission::WRITE, PropertyCategory::Config, "NA", "red/blink")
                .unavailable(),
        ]
        .into()
    }

    fn led(attr_path: Option<&str>, hw: Option<HwConfig>) -> Device {
        let mut dev = Device::probe(DeviceObject::new("ComV1", "COUNTING", "status", DeviceType::Led));
        dev.attr_path = attr_path.map(PathBuf::from);
        dev.hw_config = hw;
        dev.driver = Some(&COUNTING);
        dev.properties = Some(table());
        dev
    }

    #[test]
    fn test_unavailable_property_never_reaches_driver() {
        let env = env();
        let dev = led(Some("/sys/class/leds"), None);
        let before = CALLS.load(Ordering::SeqCst);

        let missing = LedgerError::PropertyMissing { index: 1 };
        assert_eq!(configure(&env, &dev, 1, &Value::Bool(true)), Err(missing.clone()));
        assert_eq!(read(&env, &dev, 1), Err(missing.clone()));
        assert_eq!(write(&env, &dev, 1, &Value::Bool(true)), Err(missing.clone()));
        assert_eq!(enable(&env, &dev, 1), Err(missing.clone()));
        assert_eq!(disable(&env, &dev, 1), Err(missing));
        assert_eq!(read(&env, &dev, 7), Err(LedgerError::PropertyMissing { index: 7 }));

        // Other tests share the counter; none of them target index 1.
        assert_eq!(read(&env, &dev, 0), Ok(Value::U32(0)));
        assert!(CALLS.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn test_resolve_path_backed() {
        let dev = led(Some("/sys/class/leds"), None);
        let req = resolve(&dev, 0).unwrap();
        assert_eq!(req.target, Target::Path(PathBuf::from("/sys/class/leds/red/brightness")));
        assert_eq!(req.irq_kind(), IrqKind::Sysfs);
    }

    #[test]
    fn test_resolve_config_backed() {
        let hw = HwConfig::Gpio(GpioConfig {
            gpio: 38,
            direction: GpioDirection::In,
        });
        let dev = led(None, Some(hw));
        let req = resolve(&dev, 0).unwrap();
        assert_eq!(req.target, Target::Config(&hw));
        assert_eq!(
            req.attribute(),
            Some(PathBuf::from("/sys/class/gpio/gpio38/red/brightness"))
        );
        assert_eq!(req.irq_kind(), IrqKind::Line(38));
    }

    #[test]
    fn test_resolve_without_target() {
        let dev = led(None, None);
        assert_eq!(
            resolve(&dev, 0).unwrap_err(),
            LedgerError::AttributeMissing { index: 0 }
        );
    }

    #[test]
    fn test_missing_slot_and_driver() {
        let env = env();
        let mut dev = led(Some("/sys/class/leds"), None);
        assert!(matches!(
            enable_irq(&env, &dev, 0),
            Err(LedgerError::ApiNotSupported { op: "enable_irq", .. })
        ));
        assert!(matches!(
            read_prop_count(&dev),
            Err(LedgerError::ApiNotSupported { op: "read_prop_count", .. })
        ));

        dev.driver = None;
        assert!(matches!(read(&env, &dev, 0), Err(LedgerError::DriverMissing(_))));
    }

    #[test]
    fn test_register_source_requires_route() {
        let env = env();
        let dev = led(Some("/sys/class/leds"), None);
        let req = resolve(&dev, 0).unwrap();
        assert_eq!(
            register_source(&env, &dev, &req),
            Err(LedgerError::InvalidPointer("irq route"))
        );
        assert_eq!(env.irqs.len(), 0);
    }
}
