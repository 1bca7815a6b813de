//! ADS1015 four-channel ADC (hwmon `inN_input`).

use super::common;
use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{DataType, Permission, Property, PropertyCategory, PropertyTable};
use std::sync::LazyLock;

static ADS1015_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| {
    (0..4)
        .map(|ch| {
            Property::new(
                format!("AIN{ch} VOLTAGE"),
                DataType::I32,
                Permission::READ,
                PropertyCategory::Status,
                "milliVolts",
                format!("in{}_input", ch + 4),
            )
        })
        .collect::<Vec<_>>()
        .into()
});

fn ads1015_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &ADS1015_PROPS)
}

/// Read-only converter; only `read` and the table slots are populated.
pub static ADS1015: DeviceOps = DeviceOps {
    init: Some(ads1015_init),
    registration: Some(common::registration),
    read_prop_count: Some(common::read_prop_count),
    read_props: Some(common::read_props),
    read: Some(common::read),
    ..DeviceOps::empty("ADS1015", DeviceType::Adc)
};
