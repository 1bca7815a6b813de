//! Typed attribute values.
//!
//! Attribute files carry text; `Value` is that text interpreted through a
//! property's `DataType`.

use crate::property::DataType;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A value read from, or written to, a device attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value
    Null,
    /// Single character
    Char(char),
    /// Boolean flag
    Bool(bool),
    /// Unsigned 8-bit
    U8(u8),
    /// Signed 8-bit
    I8(i8),
    /// Unsigned 16-bit
    U16(u16),
    /// Signed 16-bit
    I16(i16),
    /// Unsigned 32-bit
    U32(u32),
    /// Signed 32-bit
    I32(i32),
    /// Native integer
    Int(i64),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// Enumeration ordinal
    Enum(i32),
    /// Text
    Str(String),
}

impl Value {
    /// Parse attribute text as `data_type`. Returns `None` when the text
    /// does not represent a value of that type.
    pub fn parse(text: &str, data_type: DataType) -> Option<Value> {
        let t = text.trim();
        let v = match data_type {
            DataType::Null => Value::Null,
            DataType::Char => Value::Char(t.chars().next()?),
            DataType::Bool => match t.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => Value::Bool(true),
                "0" | "false" | "off" => Value::Bool(false),
                _ => return None,
            },
            DataType::U8 => Value::U8(t.parse().ok()?),
            DataType::I8 => Value::I8(t.parse().ok()?),
            DataType::U16 => Value::U16(t.parse().ok()?),
            DataType::I16 => Value::I16(t.parse().ok()?),
            DataType::U32 => Value::U32(t.parse().ok()?),
            DataType::I32 => Value::I32(t.parse().ok()?),
            DataType::Int => Value::Int(t.parse().ok()?),
            DataType::Float => Value::Float(t.parse().ok()?),
            DataType::Double => Value::Double(t.parse().ok()?),
            DataType::Enum => Value::Enum(t.parse().ok()?),
            DataType::String => Value::Str(t.to_string()),
        };
        Some(v)
    }

    /// Data type this value carries.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Char(_) => DataType::Char,
            Self::Bool(_) => DataType::Bool,
            Self::U8(_) => DataType::U8,
            Self::I8(_) => DataType::I8,
            Self::U16(_) => DataType::U16,
            Self::I16(_) => DataType::I16,
            Self::U32(_) => DataType::U32,
            Self::I32(_) => DataType::I32,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::Enum(_) => DataType::Enum,
            Self::Str(_) => DataType::String,
        }
    }

    /// Numeric view used for threshold comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Self::U8(v) => Some(v.into()),
            Self::I8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v.into()),
            Self::Double(v) => Some(v),
            Self::Enum(v) => Some(v.into()),
            Self::Null | Self::Char(_) | Self::Str(_) => None,
        }
    }

    /// Whether a status value reports "set". Non-numeric values are never set.
    pub fn is_set(&self) -> bool {
        self.as_f64().is_some_and(|v| v != 0.0)
    }

    /// Text written to an attribute file. `None` for `Null`.
    pub fn to_attr_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Default (zero) value of a data type.
    pub fn zero(data_type: DataType) -> Value {
        match data_type {
            DataType::Null => Value::Null,
            DataType::Char => Value::Char('0'),
            DataType::Bool => Value::Bool(false),
            DataType::U8 => Value::U8(0),
            DataType::I8 => Value::I8(0),
            DataType::U16 => Value::U16(0),
            DataType::I16 => Value::I16(0),
            DataType::U32 => Value::U32(0),
            DataType::I32 => Value::I32(0),
            DataType::Int => Value::Int(0),
            DataType::Float => Value::Float(0.0),
            DataType::Double => Value::Double(0.0),
            DataType::Enum => Value::Enum(0),
            DataType::String => Value::Str(String::new()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Enum(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}
