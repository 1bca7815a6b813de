//! Property model.
//!
//! A property is one addressable attribute of a device type: a status
//! value, a configurable limit, an alert flag or an executable action.
//! Tables are static per device type and read-only after load, so they are
//! shared as [`PropertyTable`] (`Arc<[Property]>`) without locking.
//!
//! The `parse_*` functions accept the string vocabulary used by JSON
//! property files. Each is total: unknown text yields a
//! [`PropertyParseError`], never a panic.

use bitflags::bitflags;
use core::fmt;
use core::str::FromStr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Shared, immutable property table of one device type.
pub type PropertyTable = Arc<[Property]>;

/// Storage reserved for a string attribute value, in bytes.
pub const STRING_ATTR_LEN: usize = 64;

/// Unrecognized text passed to one of the property parsers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {text:?}")]
pub struct PropertyParseError {
    /// Which vocabulary was being parsed
    pub kind: &'static str,
    /// Offending text
    pub text: String,
}

impl PropertyParseError {
    fn new(kind: &'static str, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Normalize a token: trim, upper-case, drop an optional prefix.
fn token(text: &str, prefix: &str) -> String {
    let t = text.trim().to_ascii_uppercase();
    t.strip_prefix(prefix).map(str::to_string).unwrap_or(t)
}

// ─── DataType ───────────────────────────────────────────────────────

/// Data type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Char,
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    Int,
    Float,
    Double,
    Enum,
    String,
}

impl DataType {
    /// Size of the value's storage in bytes.
    pub const fn size_of(self) -> usize {
        match self {
            Self::Null => 0,
            Self::Char | Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::Int | Self::Float | Self::Enum => 4,
            Self::Double => 8,
            Self::String => STRING_ATTR_LEN,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "null",
            Self::Char => "char",
            Self::Bool => "bool",
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Enum => "enum",
            Self::String => "string",
        };
        f.write_str(s)
    }
}

impl FromStr for DataType {
    type Err = PropertyParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match token(s, "TYPE_").as_str() {
            "NULL" => Ok(Self::Null),
            "CHAR" => Ok(Self::Char),
            "BOOL" => Ok(Self::Bool),
            "UINT8" | "U8" => Ok(Self::U8),
            "INT8" | "I8" => Ok(Self::I8),
            "UINT16" | "U16" => Ok(Self::U16),
            "INT16" | "I16" => Ok(Self::I16),
            "UINT32" | "U32" => Ok(Self::U32),
            "INT32" | "I32" => Ok(Self::I32),
            "INT" => Ok(Self::Int),
            "FLOAT" => Ok(Self::Float),
            "DOUBLE" => Ok(Self::Double),
            "ENUM" => Ok(Self::Enum),
            "STRING" => Ok(Self::String),
            _ => Err(PropertyParseError::new("data type", s)),
        }
    }
}

// ─── Permission ─────────────────────────────────────────────────────

bitflags! {
    /// Access permission of a property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permission: u8 {
        /// Executable action
        const EXEC = 0b001;
        /// Readable
        const READ = 0b010;
        /// Writable
        const WRITE = 0b100;
    }
}

impl FromStr for Permission {
    type Err = PropertyParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut perm = Permission::empty();
        for part in s.split(['|', ',']) {
            perm |= match token(part, "PERM_").as_str() {
                "EX" | "X" | "EXEC" => Permission::EXEC,
                "RD" | "R" | "READ" => Permission::READ,
                "WR" | "W" | "WRITE" => Permission::WRITE,
                "RW" => Permission::READ | Permission::WRITE,
                "RWX" => Permission::all(),
                _ => return Err(PropertyParseError::new("permission", s)),
            };
        }
        Ok(perm)
    }
}

// ─── Availability ───────────────────────────────────────────────────

/// Whether a property exists on the present hardware revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Availability {
    #[default]
    Available,
    NotAvailable,
}

impl FromStr for Availability {
    type Err = PropertyParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match token(s, "PROP_").as_str() {
            "AVAIL" | "AVAILABLE" | "YES" | "TRUE" => Ok(Self::Available),
            "NOTAVAIL" | "NOT_AVAIL" | "NOTAVAILABLE" | "NOT_AVAILABLE" | "NO" | "FALSE" => {
                Ok(Self::NotAvailable)
            }
            _ => Err(PropertyParseError::new("availability", s)),
        }
    }
}

// ─── PropertyCategory ───────────────────────────────────────────────

/// Role of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyCategory {
    Config,
    Status,
    Alert,
    Exec,
}

impl FromStr for PropertyCategory {
    type Err = PropertyParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match token(s, "PROP_TYPE_").as_str() {
            "CONFIG" => Ok(Self::Config),
            "STATUS" => Ok(Self::Status),
            "ALERT" => Ok(Self::Alert),
            "EXEC" => Ok(Self::Exec),
            _ => Err(PropertyParseError::new("property category", s)),
        }
    }
}

// ─── Comparison ─────────────────────────────────────────────────────

/// Threshold comparison applied as `current <op> limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

impl Comparison {
    /// Evaluate `current <op> limit`.
    pub fn holds(self, current: f64, limit: f64) -> bool {
        match self {
            Self::Less => current < limit,
            Self::LessOrEqual => current <= limit,
            Self::Greater => current > limit,
            Self::GreaterOrEqual => current >= limit,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        })
    }
}

impl FromStr for Comparison {
    type Err = PropertyParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match token(s, "").as_str() {
            "<" | "LT" | "LESSTHEN" | "LESSTHAN" => Ok(Self::Less),
            "<=" | "LE" | "LESSTHENEQUALTO" | "LESSTHANEQUALTO" => Ok(Self::LessOrEqual),
            ">" | "GT" | "GREATERTHEN" | "GREATERTHAN" => Ok(Self::Greater),
            ">=" | "GE" | "GREATERTHENEQUALTO" | "GREATERTHANEQUALTO" => {
                Ok(Self::GreaterOrEqual)
            }
            _ => Err(PropertyParseError::new("comparison", s)),
        }
    }
}

/// Evaluate `current <kind> limit`.
pub fn compare(current: f64, limit: f64, kind: Comparison) -> bool {
    kind.holds(current, limit)
}

/// Parse a comparison operator (`"<="`, `"GREATERTHENEQUALTO"`, ...).
pub fn parse_comparison(text: &str) -> Result<Comparison, PropertyParseError> {
    text.parse()
}

/// Parse a permission set (`"RD"`, `"PERM_RD|PERM_WR"`, `"RW"`, ...).
pub fn parse_permission(text: &str) -> Result<Permission, PropertyParseError> {
    text.parse()
}

/// Parse a property category (`"ALERT"`, `"PROP_TYPE_CONFIG"`, ...).
pub fn parse_category(text: &str) -> Result<PropertyCategory, PropertyParseError> {
    text.parse()
}

/// Parse an availability flag (`"AVAILABLE"`, `"PROP_NOTAVAIL"`, ...).
pub fn parse_availability(text: &str) -> Result<Availability, PropertyParseError> {
    text.parse()
}

/// Parse a data type (`"INT32"`, `"TYPE_BOOL"`, ...).
pub fn parse_data_type(text: &str) -> Result<DataType, PropertyParseError> {
    text.parse()
}

// ─── Property ───────────────────────────────────────────────────────

/// Threshold dependency of an alert property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    /// Index of the property holding the measured value
    pub current_index: usize,
    /// Index of the property holding the limit
    pub limit_index: usize,
    /// Comparison confirming the alert
    pub comparison: Comparison,
}

/// One addressable attribute of a device type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub data_type: DataType,
    pub permission: Permission,
    pub availability: Availability,
    pub category: PropertyCategory,
    pub units: String,
    /// Appended to the device's attribute path
    pub attr_suffix: String,
    pub dependency: Option<Dependency>,
}

impl Property {
    /// An available property without dependency.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        permission: Permission,
        category: PropertyCategory,
        units: impl Into<String>,
        attr_suffix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            permission,
            availability: Availability::Available,
            category,
            units: units.into(),
            attr_suffix: attr_suffix.into(),
            dependency: None,
        }
    }

    /// Mark as absent on this hardware revision.
    pub fn unavailable(mut self) -> Self {
        self.availability = Availability::NotAvailable;
        self
    }

    /// Attach a threshold dependency.
    pub fn depends_on(mut self, current_index: usize, limit_index: usize, comparison: Comparison) -> Self {
        self.dependency = Some(Dependency {
            current_index,
            limit_index,
            comparison,
        });
        self
    }

    /// Whether the property exists on this chip revision.
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Whether the property is an alert attribute.
    pub fn is_alert(&self) -> bool {
        self.category == PropertyCategory::Alert
    }

    /// Basename of the attribute suffix, used to match fired attribute paths.
    pub fn attr_basename(&self) -> Option<&std::ffi::OsStr> {
        Path::new(&self.attr_suffix).file_name()
    }
}

/// Whether `index` names an available property of `table`.
/// Out-of-range indices are not available.
pub fn is_available(table: &[Property], index: usize) -> bool {
    table.get(index).is_some_and(Property::is_available)
}

/// Check the dependency invariant: every alert property either has no
/// dependency or both of its indices name available properties.
pub fn validate_table(table: &[Property]) -> Result<(), String> {
    for (idx, prop) in table.iter().enumerate() {
        let Some(dep) = prop.dependency.filter(|_| prop.is_alert()) else {
            continue;
        };
        for (role, target) in [("current", dep.current_index), ("limit", dep.limit_index)] {
            if !is_available(table, target) {
                return Err(format!(
                    "property {idx} ({}) {role} index {target} is not an available property",
                    prop.name
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Vec<Property> {
        vec![
            Property::new("TEMP", DataType::I32, Permission::READ, PropertyCategory::Status, "mC", "temp1_input"),
            Property::new("MAX", DataType::I32, Permission::READ | Permission::WRITE, PropertyCategory::Config, "mC", "temp1_max"),
            Property::new("MAX ALERT", DataType::Bool, Permission::READ, PropertyCategory::Alert, "NA", "temp1_max_alarm")
                .depends_on(0, 1, Comparison::GreaterOrEqual),
            Property::new("HYST", DataType::I32, Permission::READ, PropertyCategory::Config, "mC", "temp1_max_hyst")
                .unavailable(),
        ]
    }

    #[test]
    fn test_comparison_truth_table() {
        let samples = [(4.0, 5.0), (5.0, 5.0), (6.0, 5.0)];
        let expect = [
            (Comparison::Less, [true, false, false]),
            (Comparison::LessOrEqual, [true, true, false]),
            (Comparison::Greater, [false, false, true]),
            (Comparison::GreaterOrEqual, [false, true, true]),
        ];
        for (kind, results) in expect {
            for ((current, limit), want) in samples.iter().zip(results) {
                assert_eq!(compare(*current, *limit, kind), want, "{current} {kind} {limit}");
            }
        }
        assert!(compare(5.0, 5.0, Comparison::LessOrEqual));
        assert!(!compare(5.0, 5.0, Comparison::Less));
        assert!(compare(6.0, 5.0, Comparison::GreaterOrEqual));
    }

    #[test]
    fn test_parse_comparison() {
        assert_eq!(parse_comparison("<="), Ok(Comparison::LessOrEqual));
        assert_eq!(parse_comparison("GREATERTHENEQUALTO"), Ok(Comparison::GreaterOrEqual));
        assert_eq!(parse_comparison(" lessthen "), Ok(Comparison::Less));
        assert!(parse_comparison("==").is_err());
    }

    #[test]
    fn test_parse_permission() {
        assert_eq!(parse_permission("RD"), Ok(Permission::READ));
        assert_eq!(
            parse_permission("PERM_RD|PERM_WR"),
            Ok(Permission::READ | Permission::WRITE)
        );
        assert_eq!(parse_permission("rw"), Ok(Permission::READ | Permission::WRITE));
        assert_eq!(parse_permission("EX"), Ok(Permission::EXEC));
        assert!(parse_permission("RD|bogus").is_err());
    }

    #[test]
    fn test_parse_category_availability_data_type() {
        assert_eq!(parse_category("PROP_TYPE_ALERT"), Ok(PropertyCategory::Alert));
        assert_eq!(parse_category("config"), Ok(PropertyCategory::Config));
        assert!(parse_category("metric").is_err());

        assert_eq!(parse_availability("PROP_AVAIL"), Ok(Availability::Available));
        assert_eq!(parse_availability("PROP_NOTAVAIL"), Ok(Availability::NotAvailable));
        assert!(parse_availability("sometimes").is_err());

        assert_eq!(parse_data_type("TYPE_INT32"), Ok(DataType::I32));
        assert_eq!(parse_data_type("uint8"), Ok(DataType::U8));
        assert!(parse_data_type("int128").is_err());
    }

    #[test]
    fn test_size_of() {
        assert_eq!(DataType::Null.size_of(), 0);
        assert_eq!(DataType::Bool.size_of(), 1);
        assert_eq!(DataType::I16.size_of(), 2);
        assert_eq!(DataType::I32.size_of(), 4);
        assert_eq!(DataType::Double.size_of(), 8);
        assert_eq!(DataType::String.size_of(), STRING_ATTR_LEN);
    }

    #[test]
    fn test_is_available() {
        let table = sample_table();
        assert!(is_available(&table, 0));
        assert!(!is_available(&table, 3));
        assert!(!is_available(&table, 42));
    }

    #[test]
    fn test_validate_table() {
        let mut table = sample_table();
        assert!(validate_table(&table).is_ok());

        table[2].dependency = Some(Dependency {
            current_index: 0,
            limit_index: 3,
            comparison: Comparison::GreaterOrEqual,
        });
        assert!(validate_table(&table).unwrap_err().contains("limit index 3"));

        table[2].dependency = Some(Dependency {
            current_index: 9,
            limit_index: 1,
            comparison: Comparison::GreaterOrEqual,
        });
        assert!(validate_table(&table).is_err());
    }

    #[test]
    fn test_attr_basename() {
        let p = Property::new("A", DataType::Bool, Permission::READ, PropertyCategory::Alert, "NA", "hwmon/temp1_max_alarm");
        assert_eq!(p.attr_basename().and_then(|s| s.to_str()), Some("temp1_max_alarm"));
    }
}
