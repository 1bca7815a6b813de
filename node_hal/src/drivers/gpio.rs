//! GPIO line through the legacy sysfs interface.
//!
//! Devices may give an attribute directory (`/sys/class/gpio/gpioN/`) or a
//! `hw.gpio` line number; both resolve to the same attributes. The line's
//! `value` doubles as a status-only alert once `edge` is set.

use super::common;
use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use node_common::alert::AlertState;
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{DataType, Permission, Property, PropertyCategory, PropertyTable};
use std::sync::LazyLock;

const LEVEL_ALERT: usize = 3;

static GPIO_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| {
    let rw = Permission::READ | Permission::WRITE;
    vec![
        Property::new("VALUE", DataType::Bool, rw, PropertyCategory::Status, "NA", "value"),
        Property::new("DIRECTION", DataType::String, rw, PropertyCategory::Config, "NA", "direction"),
        Property::new("EDGE", DataType::String, rw, PropertyCategory::Config, "NA", "edge"),
        Property::new("LEVEL ALERT", DataType::Bool, Permission::READ, PropertyCategory::Alert, "NA", "value"),
        Property::new("ACTIVE LOW", DataType::Bool, rw, PropertyCategory::Config, "NA", "active_low"),
    ]
    .into()
});

fn irq_type(index: usize) -> Option<AlertState> {
    (index == LEVEL_ALERT).then_some(AlertState::HighAlarmActive)
}

fn gpio_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &GPIO_PROPS)
}

/// Generic GPIO line.
pub static GPIO: DeviceOps = common::sysfs_ops("GPIO", DeviceType::Gpio, gpio_init, Some(irq_type));
