//! DAT31R5A digital step attenuator.
//!
//! No alert outputs; the interrupt slots are left empty.

use super::common;
use crate::device::Device;
use crate::driver::{DeviceOps, DriverEnv};
use node_common::device::DeviceType;
use node_common::error::LedgerError;
use node_common::property::{DataType, Permission, Property, PropertyCategory, PropertyTable};
use std::sync::LazyLock;

static DAT31R5A_PROPS: LazyLock<PropertyTable> = LazyLock::new(|| {
    let rw = Permission::READ | Permission::WRITE;
    vec![
        Property::new("ATTENUATION", DataType::I32, rw, PropertyCategory::Config, "milliDecibel", "attenuation"),
        Property::new("LATCH ENABLE", DataType::Bool, Permission::WRITE, PropertyCategory::Exec, "NA", "latch"),
    ]
    .into()
});

fn dat31r5a_init(env: &DriverEnv, dev: &mut Device) -> Result<(), LedgerError> {
    common::init_with(env, dev, &DAT31R5A_PROPS)
}

/// 6-bit, 31.5 dB attenuator.
pub static DAT31R5A: DeviceOps = DeviceOps {
    register_callback: None,
    deregister_callback: None,
    enable_irq: None,
    disable_irq: None,
    confirm_irq: None,
    ..common::sysfs_ops("DAT31R5A", DeviceType::Attenuation, dat31r5a_init, None)
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_interrupt_slots() {
        assert!(DAT31R5A.enable_irq.is_none());
        assert!(DAT31R5A.irq_type.is_none());
        assert!(DAT31R5A.enable.is_some());
        assert_eq!(DAT31R5A_PROPS.len(), 2);
    }
}
