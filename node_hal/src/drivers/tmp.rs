//! Temperature sensors: TMP464, SE98, ADT7481.
//!
//! Tables are built per channel; channel `n` occupies indices
//! `10 * n .. 10 * n + 10` with the hwmon `temp<n+1>_*` attributes.

use super::common;
use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use node_common::alert::AlertState;
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{Comparison, DataType, Permission, Property, PropertyCategory, PropertyTable};
use std::sync::LazyLock;

const STRIDE: usize = 10;

const TEMP: usize = 0;
const MIN: usize = 1;
const MAX: usize = 2;
const CRIT: usize = 3;
const MIN_ALARM: usize = 4;
const MAX_ALARM: usize = 5;
const CRIT_ALARM: usize = 6;

const MC: &str = "milliCelsius";

fn channel(n: usize, with_offset: bool) -> Vec<Property> {
    let base = n * STRIDE;
    let t = n + 1;
    let rw = Permission::READ | Permission::WRITE;
    let limit = |label: &str, attr: &str| {
        Property::new(format!("T{t} {label}"), DataType::I32, rw, PropertyCategory::Config, MC, format!("temp{t}_{attr}"))
    };
    let alarm = |label: &str, attr: &str| {
        Property::new(format!("T{t} {label}"), DataType::Bool, Permission::READ, PropertyCategory::Alert, "NA", format!("temp{t}_{attr}"))
    };

    let mut offset = Property::new(format!("T{t} OFFSET"), DataType::I32, rw, PropertyCategory::Config, "NA", format!("temp{t}_offset"));
    if !with_offset {
        offset = offset.unavailable();
    }

    vec![
        Property::new(format!("T{t} TEMPERATURE"), DataType::I32, Permission::READ, PropertyCategory::Status, MC, format!("temp{t}_input")),
        limit("LOW LIMIT", "min"),
        limit("HIGH LIMIT", "max"),
        limit("CRITICAL LIMIT", "crit"),
        alarm("LOW LIMIT ALERT", "min_alarm").depends_on(base + TEMP, base + MIN, Comparison::LessOrEqual),
        alarm("HIGH LIMIT ALERT", "max_alarm").depends_on(base + TEMP, base + MAX, Comparison::GreaterOrEqual),
        alarm("CRITICAL LIMIT ALERT", "crit_alarm").depends_on(base + TEMP, base + CRIT, Comparison::GreaterOrEqual),
        limit("CRITICAL HYSTERESIS", "crit_hyst"),
        limit("MAX HYSTERESIS", "max_hyst").unavailable(),
        offset,
    ]
}

fn table(channels: usize, with_offset: bool) -> PropertyTable {
    (0..channels)
        .flat_map(|n| channel(n, with_offset))
        .collect::<Vec<_>>()
        .into()
}

/// Alert state of a temperature alarm property.
pub fn irq_type(index: usize) -> Option<AlertState> {
    match index % STRIDE {
        MIN_ALARM => Some(AlertState::LowAlarmActive),
        MAX_ALARM => Some(AlertState::HighAlarmActive),
        CRIT_ALARM => Some(AlertState::CriticalAlarmActive),
        _ => None,
    }
}

static TMP464_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| table(3, true));
static SE98_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| table(1, false));
static ADT7481_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| table(2, true));

fn tmp464_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &TMP464_PROPS)
}

fn se98_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &SE98_PROPS)
}

fn adt7481_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &ADT7481_PROPS)
}

/// Three-channel remote/local sensor.
pub static TMP464: DeviceOps = DeviceOps {
    enable: None,
    disable: None,
    ..common::sysfs_ops("TMP464", DeviceType::Temperature, tmp464_init, Some(irq_type))
};

/// Single-channel DIMM sensor.
pub static SE98: DeviceOps = DeviceOps {
    enable: None,
    disable: None,
    ..common::sysfs_ops("SE98", DeviceType::Temperature, se98_init, Some(irq_type))
};

/// Dual-channel sensor.
pub static ADT7481: DeviceOps = DeviceOps {
    enable: None,
    disable: None,
    ..common::sysfs_ops("ADT7481", DeviceType::Temperature, adt7481_init, Some(irq_type))
};
