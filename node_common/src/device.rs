//! Device identity and module configuration descriptors.
//!
//! `DeviceObject` is the identity tuple every ledger operation is keyed on.
//! Equality is case-insensitive on all string fields, so a device named
//! `"TMP464"` on module `"ComV1"` is the same device as `"tmp464"` on
//! `"comv1"`.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

// ─── DeviceType ─────────────────────────────────────────────────────

/// Device category. Each category owns one ledger partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DeviceType {
    /// Temperature sensors
    #[serde(alias = "tmp")]
    Temperature = 0,
    /// Power monitors
    #[serde(alias = "pwr")]
    Power = 1,
    /// RF attenuators
    #[serde(alias = "att")]
    Attenuation = 2,
    /// LEDs
    Led = 3,
    /// General purpose I/O
    Gpio = 4,
    /// Analog-to-digital converters
    Adc = 5,
}

impl DeviceType {
    /// All device categories, in partition order.
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Temperature,
        DeviceType::Power,
        DeviceType::Attenuation,
        DeviceType::Led,
        DeviceType::Gpio,
        DeviceType::Adc,
    ];
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Power => write!(f, "power"),
            Self::Attenuation => write!(f, "attenuation"),
            Self::Led => write!(f, "led"),
            Self::Gpio => write!(f, "gpio"),
            Self::Adc => write!(f, "adc"),
        }
    }
}

impl FromStr for DeviceType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "tmp" => Ok(Self::Temperature),
            "power" | "pwr" => Ok(Self::Power),
            "attenuation" | "att" => Ok(Self::Attenuation),
            "led" => Ok(Self::Led),
            "gpio" => Ok(Self::Gpio),
            "adc" => Ok(Self::Adc),
            _ => Err(format!("unknown DeviceType: {s:?}")),
        }
    }
}

// ─── DeviceObject ───────────────────────────────────────────────────

/// Identity of a device: owning module, chip name, description and category.
///
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceObject {
    /// Owning module identifier
    pub module_id: String,
    /// Chip / device-type name, used to select the driver table
    pub name: String,
    /// Free-form description, distinguishes instances of the same chip
    pub description: String,
    /// Device category
    pub device_type: DeviceType,
}

impl DeviceObject {
    /// Create a new identity tuple.
    pub fn new(
        module_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        device_type: DeviceType,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            name: name.into(),
            description: description.into(),
            device_type,
        }
    }
}

impl PartialEq for DeviceObject {
    fn eq(&self, other: &Self) -> bool {
        self.device_type == other.device_type
            && self.module_id.eq_ignore_ascii_case(&other.module_id)
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.description.eq_ignore_ascii_case(&other.description)
    }
}

impl Eq for DeviceObject {}

impl Hash for DeviceObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.device_type.hash(state);
        for field in [&self.module_id, &self.name, &self.description] {
            for b in field.bytes() {
                state.write_u8(b.to_ascii_lowercase());
            }
            state.write_u8(0xff);
        }
    }
}

impl fmt::Display for DeviceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}, {})",
            self.module_id, self.name, self.description, self.device_type
        )
    }
}

// ─── Hardware configuration blobs ───────────────────────────────────

/// I2C bus location of a sensor chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct I2cConfig {
    /// I2C bus number
    pub bus: u8,
    /// 7-bit slave address
    pub address: u16,
}

/// GPIO line direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioDirection {
    /// Input line
    #[default]
    In,
    /// Output line
    Out,
}

/// GPIO line descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpioConfig {
    /// Global GPIO number
    pub gpio: u32,
    /// Line direction
    #[serde(default)]
    pub direction: GpioDirection,
}

/// Tri-color LED channel numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedConfig {
    /// Red channel
    pub red: u32,
    /// Green channel
    pub green: u32,
    /// Blue channel
    pub blue: u32,
}

/// Per-device hardware configuration blob, shaped by device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HwConfig {
    /// Bus-attached sensor (temperature, power, attenuation, adc)
    I2c(I2cConfig),
    /// GPIO line
    Gpio(GpioConfig),
    /// Tri-color LED
    Led(LedConfig),
}

impl HwConfig {
    /// Whether this blob kind belongs to the given device category.
    pub fn fits(&self, device_type: DeviceType) -> bool {
        match self {
            Self::I2c(_) => matches!(
                device_type,
                DeviceType::Temperature
                    | DeviceType::Power
                    | DeviceType::Attenuation
                    | DeviceType::Adc
            ),
            Self::Gpio(_) => device_type == DeviceType::Gpio,
            Self::Led(_) => device_type == DeviceType::Led,
        }
    }
}

// ─── DeviceDescriptor ───────────────────────────────────────────────

/// One device entry of a module configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Chip name (selects the driver table)
    pub name: String,
    /// Instance description
    #[serde(default)]
    pub description: String,
    /// Device category
    pub device_type: DeviceType,
    /// Attribute directory of a sysfs-backed device
    #[serde(default)]
    pub attr_path: Option<String>,
    /// Hardware configuration blob
    #[serde(default)]
    pub hw: Option<HwConfig>,
}

impl DeviceDescriptor {
    /// Identity this descriptor produces on the given module.
    pub fn object(&self, module_id: &str) -> DeviceObject {
        DeviceObject::new(module_id, &self.name, &self.description, self.device_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(obj: &DeviceObject) -> u64 {
        let mut h = DefaultHasher::new();
        obj.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_object_equality_ignores_case() {
        let a = DeviceObject::new("ComV1", "TMP464", "PA Temp", DeviceType::Temperature);
        let b = DeviceObject::new("COMV1", "tmp464", "pa temp", DeviceType::Temperature);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_object_single_field_change_breaks_equality() {
        let base = DeviceObject::new("ComV1", "TMP464", "PA Temp", DeviceType::Temperature);

        let mut other = base.clone();
        other.module_id = "ComV2".into();
        assert_ne!(base, other);

        let mut other = base.clone();
        other.name = "SE98".into();
        assert_ne!(base, other);

        let mut other = base.clone();
        other.description = "LNA Temp".into();
        assert_ne!(base, other);

        let mut other = base.clone();
        other.device_type = DeviceType::Power;
        assert_ne!(base, other);
    }

    #[test]
    fn test_device_type_from_str_aliases() {
        assert_eq!("tmp".parse::<DeviceType>(), Ok(DeviceType::Temperature));
        assert_eq!("PWR".parse::<DeviceType>(), Ok(DeviceType::Power));
        assert_eq!("Attenuation".parse::<DeviceType>(), Ok(DeviceType::Attenuation));
        assert!("fan".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_hw_config_untagged_deserialization() {
        #[derive(Deserialize)]
        struct Wrapper {
            hw: HwConfig,
        }

        let w: Wrapper = toml::from_str("hw = { bus = 1, address = 72 }").unwrap();
        assert_eq!(w.hw, HwConfig::I2c(I2cConfig { bus: 1, address: 72 }));
        assert!(w.hw.fits(DeviceType::Temperature));
        assert!(!w.hw.fits(DeviceType::Gpio));

        let w: Wrapper = toml::from_str("hw = { gpio = 38, direction = \"out\" }").unwrap();
        assert_eq!(
            w.hw,
            HwConfig::Gpio(GpioConfig {
                gpio: 38,
                direction: GpioDirection::Out
            })
        );
        assert!(w.hw.fits(DeviceType::Gpio));

        let w: Wrapper = toml::from_str("hw = { red = 1, green = 2, blue = 3 }").unwrap();
        assert!(matches!(w.hw, HwConfig::Led(_)));
        assert!(w.hw.fits(DeviceType::Led));
    }

    #[test]
    fn test_descriptor_object() {
        let desc = DeviceDescriptor {
            name: "INA226".into(),
            description: "Main rail".into(),
            device_type: DeviceType::Power,
            attr_path: None,
            hw: None,
        };
        let obj = desc.object("ComV1");
        assert_eq!(obj.module_id, "ComV1");
        assert_eq!(obj.device_type, DeviceType::Power);
    }
}
