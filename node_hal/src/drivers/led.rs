//! Tri-color LED exposed as one LED class directory per color.

use super::common;
use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{DataType, Permission, Property, PropertyCategory, PropertyTable};
use std::sync::LazyLock;

static LED_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| {
    let rw = Permission::READ | Permission::WRITE;
    ["red", "green", "blue"]
        .into_iter()
        .flat_map(|color| {
            let upper = color.to_ascii_uppercase();
            [
                Property::new(format!("{upper} BRIGHTNESS"), DataType::U8, rw, PropertyCategory::Config, "NA", format!("{color}/brightness")),
                Property::new(format!("{upper} MAX BRIGHTNESS"), DataType::U8, Permission::READ, PropertyCategory::Status, "NA", format!("{color}/max_brightness")),
                Property::new(format!("{upper} TRIGGER"), DataType::String, rw, PropertyCategory::Config, "NA", format!("{color}/trigger")),
            ]
        })
        .collect::<Vec<_>>()
        .into()
});

fn led_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &LED_PROPS)
}

/// RGB LED. `enable`/`disable` switch a brightness attribute fully on or off.
pub static LED_TRICOLOR: DeviceOps = DeviceOps {
    register_callback: None,
    deregister_callback: None,
    enable_irq: None,
    disable_irq: None,
    confirm_irq: None,
    ..common::sysfs_ops("LED-TRICOLOR", DeviceType::Led, led_init, None)
};
