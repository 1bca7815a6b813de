//! Slots shared by the built-in sysfs drivers.
//!
//! Path-backed devices go through the attribute accessor directly. GPIO
//! devices configured only with a line number use the legacy GPIO sysfs
//! interface. Any other hardware blob has no transport here.

use crate::alert;
use crate::device::Device;
use crate::dispatch::{self, Request};
use crate::driver::{DeviceOps, DriverEnv, InitFn, IrqTypeFn};
use crate::irq::IrqCallback;
use node_common::alert::AlertCallbackData;
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{self, PropertyTable};
use node_common::value::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Table with every common slot populated.
pub const fn sysfs_ops(
    name: &'static str,
    device_type: DeviceType,
    init: InitFn,
    irq_type: Option<IrqTypeFn>,
) -> DeviceOps {
    DeviceOps {
        name,
        device_type,
        init: Some(init),
        registration: Some(registration),
        read_prop_count: Some(read_prop_count),
        read_props: Some(read_props),
        configure: Some(write),
        read: Some(read),
        write: Some(write),
        enable: Some(enable),
        disable: Some(disable),
        register_callback: Some(register_callback),
        deregister_callback: Some(deregister_callback),
        enable_irq: Some(enable_irq),
        disable_irq: Some(disable_irq),
        confirm_irq: Some(confirm_irq),
        irq_type,
    }
}

/// Load the device's property table, then run the driver's registration.
///
/// The external loader is asked first; without an entry there, `fallback`
/// (the driver's compiled-in table) is used.
pub fn init_with(
    env: &DriverEnv,
    dev: &mut Device,
    fallback: &PropertyTable,
) -> Result<(), LedgerError> {
    let ops = dev
        .driver
        .ok_or_else(|| LedgerError::DriverMissing(dev.obj.to_string()))?;

    let table = match env
        .properties
        .as_ref()
        .and_then(|loader| loader.property_table(ops.name))
    {
        Some(table) => table,
        None => {
            debug!(
                "{}: using static property table with {} properties",
                ops.name,
                fallback.len()
            );
            PropertyTable::clone(fallback)
        }
    };
    property::validate_table(&table).map_err(LedgerError::PropertyTableInvalid)?;
    dev.properties = Some(table);

    if let Some(registration) = ops.registration {
        registration(env, dev)?;
    }
    Ok(())
}

/// Check the device's backing is present. A missing directory is logged,
/// not fatal: attributes may appear once the chip's driver binds.
pub fn registration(env: &DriverEnv, dev: &Device) -> Result<(), LedgerError> {
    match (&dev.attr_path, &dev.hw_config) {
        (Some(base), _) if !env.attrs.exists(base) => {
            warn!("{}: attribute directory {:?} not present", dev.obj, base);
        }
        (None, None) => {
            warn!("{}: no attribute path or hardware config", dev.obj);
        }
        _ => debug!("{}: registered with {}", dev.obj, dev.driver_name()),
    }
    Ok(())
}

/// Number of loaded properties.
pub fn read_prop_count(dev: &Device) -> Result<usize, LedgerError> {
    Ok(dev.property_table().len())
}

/// Loaded property table.
pub fn read_props(dev: &Device) -> Result<PropertyTable, LedgerError> {
    dev.properties
        .clone()
        .ok_or_else(|| LedgerError::DriverMissing(dev.obj.to_string()))
}

fn attribute(env: &DriverEnv, dev: &Device, req: &Request<'_>) -> Result<PathBuf, LedgerError> {
    let path = req
        .attribute()
        .ok_or_else(|| LedgerError::DriverMissing(dev.obj.to_string()))?;
    if !env.attrs.exists(&path) {
        return Err(LedgerError::AttributeMissing { index: req.index });
    }
    Ok(path)
}

/// Read the property's attribute.
pub fn read(env: &DriverEnv, dev: &Device, req: &Request<'_>) -> Result<Value, LedgerError> {
    let path = attribute(env, dev, req)?;
    Ok(env.attrs.read_typed(&path, req.property.data_type)?)
}

/// Write the property's attribute. Also serves `configure`.
pub fn write(
    env: &DriverEnv,
    dev: &Device,
    req: &Request<'_>,
    value: &Value,
) -> Result<(), LedgerError> {
    let path = attribute(env, dev, req)?;
    Ok(env.attrs.write_typed(&path, req.property.data_type, value)?)
}

fn switch(env: &DriverEnv, dev: &Device, req: &Request<'_>, on: bool) -> Result<(), LedgerError> {
    let data_type = req.property.data_type;
    let value = Value::parse(if on { "1" } else { "0" }, data_type).unwrap_or(Value::Bool(on));
    write(env, dev, req, &value)
}

/// Write `1` to the property's attribute.
pub fn enable(env: &DriverEnv, dev: &Device, req: &Request<'_>) -> Result<(), LedgerError> {
    switch(env, dev, req, true)
}

/// Write `0` to the property's attribute.
pub fn disable(env: &DriverEnv, dev: &Device, req: &Request<'_>) -> Result<(), LedgerError> {
    switch(env, dev, req, false)
}

/// Install the interrupt route.
pub fn register_callback(dev: &mut Device, route: IrqCallback) -> Result<(), LedgerError> {
    dev.irq_route = Some(route);
    Ok(())
}

/// Remove the interrupt route.
pub fn deregister_callback(dev: &mut Device) -> Result<(), LedgerError> {
    dev.irq_route = None;
    Ok(())
}

/// Start a monitor on the property's attribute.
pub fn enable_irq(env: &DriverEnv, dev: &Device, req: &Request<'_>) -> Result<(), LedgerError> {
    dispatch::register_source(env, dev, req)
}

/// Stop the monitor on the property's attribute.
pub fn disable_irq(env: &DriverEnv, dev: &Device, req: &Request<'_>) -> Result<(), LedgerError> {
    dispatch::deregister_source(env, dev, req)
}

/// Evaluate a fired attribute with the device's `irq_type` codes.
pub fn confirm_irq(
    env: &DriverEnv,
    dev: &Device,
    fired: &Path,
) -> Result<Vec<AlertCallbackData>, LedgerError> {
    let irq_type = dev.driver.and_then(|ops| ops.irq_type);
    let verdict = alert::evaluate(env.attrs.as_ref(), dev, irq_type, fired)?;
    Ok(verdict.into_event().into_iter().collect())
}
