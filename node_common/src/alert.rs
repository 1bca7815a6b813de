//! Alert states and the payload handed to application callbacks.

use crate::value::Value;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Classified state of an alert property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertState {
    /// Condition cleared
    NoAlarmActive,
    /// Measured value at or below its low limit
    LowAlarmActive,
    /// Measured value at or above its high limit
    HighAlarmActive,
    /// Measured value at or above its critical limit
    CriticalAlarmActive,
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoAlarmActive => "no alarm",
            Self::LowAlarmActive => "low alarm",
            Self::HighAlarmActive => "high alarm",
            Self::CriticalAlarmActive => "critical alarm",
        })
    }
}

/// One classified alert event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCallbackData {
    /// Classified state
    pub alert_state: AlertState,
    /// Index of the alert property that fired
    pub property_index: usize,
    /// Measured value behind the alert (status value for status-only alerts)
    pub raw_value: Value,
}
