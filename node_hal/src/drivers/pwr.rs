//! INA226 power monitor.

use super::common;
use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use node_common::alert::AlertState;
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{
    Comparison, DataType, Permission, Property, PropertyCategory, PropertyTable,
};
use std::sync::LazyLock;

const SHUNT_VOLTAGE: usize = 0;
const BUS_VOLTAGE: usize = 1;
const POWER: usize = 3;
const SHUNT_CRIT_LOW: usize = 6;
const SHUNT_CRIT_HIGH: usize = 7;
const SHUNT_CRIT_LOW_ALARM: usize = 8;
const SHUNT_CRIT_HIGH_ALARM: usize = 9;
const BUS_CRIT_LOW: usize = 10;
const BUS_CRIT_HIGH: usize = 11;
const BUS_CRIT_LOW_ALARM: usize = 12;
const BUS_CRIT_HIGH_ALARM: usize = 13;
const POWER_CRIT: usize = 14;
const POWER_CRIT_ALARM: usize = 15;

fn table() -> PropertyTable {
    use DataType::{Bool, I32};
    use PropertyCategory::{Alert, Config, Status};
    let rd = Permission::READ;
    let rw = Permission::READ | Permission::WRITE;

    vec![
        Property::new("SHUNT VOLTAGE", I32, rd, Status, "milliVolts", "in0_input"),
        Property::new("BUS VOLTAGE", I32, rd, Status, "milliVolts", "in1_input"),
        Property::new("CURRENT", I32, rd, Status, "milliAmp", "curr1_input"),
        Property::new("POWER", I32, rd, Status, "microWatt", "power1_input"),
        Property::new("SHUNT RESISTANCE", I32, rw, Config, "microOhm", "shunt_resistor"),
        Property::new("CALIBRATION", I32, rw, Config, "NA", "calibration"),
        Property::new("CRIT LOW SHUNT VOLTAGE", I32, rw, Config, "milliVolts", "in0_lcrit"),
        Property::new("CRIT HIGH SHUNT VOLTAGE", I32, rw, Config, "milliVolts", "in0_crit"),
        Property::new("SHUNT VOLTAGE CRIT LOW ALARM", Bool, rd, Alert, "NA", "in0_lcrit_alarm")
            .depends_on(SHUNT_VOLTAGE, SHUNT_CRIT_LOW, Comparison::LessOrEqual),
        Property::new("SHUNT VOLTAGE CRIT HIGH ALARM", Bool, rd, Alert, "NA", "in0_crit_alarm")
            .depends_on(SHUNT_VOLTAGE, SHUNT_CRIT_HIGH, Comparison::GreaterOrEqual),
        Property::new("LOW VOLTAGE LIMIT", I32, rw, Config, "milliVolts", "in1_lcrit"),
        Property::new("HIGH VOLTAGE LIMIT", I32, rd, Config, "milliVolts", "in1_crit"),
        Property::new("BUS VOLTAGE CRIT LOW ALARM", Bool, rd, Alert, "NA", "in1_lcrit_alarm")
            .depends_on(BUS_VOLTAGE, BUS_CRIT_LOW, Comparison::LessOrEqual),
        Property::new("BUS VOLTAGE CRIT HIGH ALARM", Bool, rd, Alert, "NA", "in1_crit_alarm")
            .depends_on(BUS_VOLTAGE, BUS_CRIT_HIGH, Comparison::GreaterOrEqual),
        Property::new("CRITICAL HIGH POWER LIMIT", I32, rw, Config, "microWatt", "power1_crit"),
        Property::new("CRITICAL HIGH POWER", Bool, rd, Alert, "NA", "power1_crit_alarm")
            .depends_on(POWER, POWER_CRIT, Comparison::GreaterOrEqual),
        Property::new("DATA CONVERSION TIME", I32, rw, Config, "milliSeconds", "update_interval"),
    ]
    .into()
}

static INA226_PROPS: LazyLock<PropertyTable> = LazyLock::new(table);

/// Alert state of an INA226 alarm property.
pub fn irq_type(index: usize) -> Option<AlertState> {
    match index {
        SHUNT_CRIT_LOW_ALARM | BUS_CRIT_LOW_ALARM => Some(AlertState::LowAlarmActive),
        SHUNT_CRIT_HIGH_ALARM | BUS_CRIT_HIGH_ALARM | POWER_CRIT_ALARM => {
            Some(AlertState::CriticalAlarmActive)
        }
        _ => None,
    }
}

fn ina226_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &INA226_PROPS)
}

/// Current/voltage/power monitor with alert pin.
pub static INA226: DeviceOps = DeviceOps {
    enable: None,
    disable: None,
    ..common::sysfs_ops("INA226", DeviceType::Power, ina226_init, Some(irq_type))
};
