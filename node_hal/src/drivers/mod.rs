//! Built-in chip drivers.

pub mod adc;
pub mod att;
pub mod common;
pub mod gpio;
pub mod led;
pub mod pwr;
pub mod tmp;

use crate::driver_registry::DriverRegistry;

/// Register every built-in driver table.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register(&tmp::TMP464);
    registry.register(&tmp::SE98);
    registry.register(&tmp::ADT7481);
    registry.register(&pwr::INA226);
    registry.register(&att::DAT31R5A);
    registry.register(&led::LED_TRICOLOR);
    registry.register(&gpio::GPIO);
    registry.register(&adc::ADS1015);
}
