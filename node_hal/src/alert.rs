//! Alert evaluator.
//!
//! A fired attribute is only a hint. The hardware status bit pre-filters,
//! and the threshold comparison of the property's dependency decides:
//!
//! | status bit | comparison | verdict                        |
//! |------------|------------|--------------------------------|
//! | any        | holds      | alert with the driver's code   |
//! | clear      | fails      | `NoAlarmActive` (clear event)  |
//! | set        | fails      | false trigger, discarded       |
//!
//! Alert properties without a dependency are decided by the status bit.

use crate::attr::AttributeAccessor;
use crate::device::Device;
use crate::dispatch;
use crate::driver::IrqTypeFn;
use node_common::alert::{AlertCallbackData, AlertState};
use node_common::error::LedgerError;
use node_common::value::Value;
use std::path::Path;
use tracing::{trace, warn};

/// Outcome of evaluating a fired attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// No alert property of the device owns the fired attribute.
    Unowned,
    /// An alert or a clear event.
    Event(AlertCallbackData),
    /// Status bit set but the threshold does not confirm it.
    FalseTrigger {
        /// Alert property that fired
        property_index: usize,
    },
}

impl Verdict {
    /// Whether an event should reach the application.
    pub fn event_occurred(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// The event, if one occurred.
    pub fn into_event(self) -> Option<AlertCallbackData> {
        match self {
            Self::Event(data) => Some(data),
            _ => None,
        }
    }
}

fn read_at(
    attrs: &dyn AttributeAccessor,
    dev: &Device,
    index: usize,
) -> Result<Value, LedgerError> {
    let path = dispatch::attribute_path(dev, index)?;
    let data_type = dev.property_table()[index].data_type;
    Ok(attrs.read_typed(&path, data_type)?)
}

fn numeric(value: &Value, index: usize) -> Result<f64, LedgerError> {
    value.as_f64().ok_or_else(|| {
        LedgerError::PropertyTableInvalid(format!(
            "dependency property {index} holds non-numeric value {value}"
        ))
    })
}

/// Classify a signal on `fired` for `dev`.
///
/// `irq_type` maps a confirmed alert property to its state code.
///
/// # Errors
/// Read failures propagate unchanged. A confirmed alert without an
/// `irq_type` slot is `ApiNotSupported`; one the slot has no code for is
/// `PropertyMissing`.
pub fn evaluate(
    attrs: &dyn AttributeAccessor,
    dev: &Device,
    irq_type: Option<IrqTypeFn>,
    fired: &Path,
) -> Result<Verdict, LedgerError> {
    let Some(basename) = fired.file_name() else {
        return Ok(Verdict::Unowned);
    };
    let owner = dev
        .property_table()
        .iter()
        .enumerate()
        .find(|(_, p)| p.is_alert() && p.attr_basename() == Some(basename));
    let Some((index, property)) = owner else {
        trace!("{:?} is not an alert attribute of {}", fired, dev.obj);
        return Ok(Verdict::Unowned);
    };

    let status = read_at(attrs, dev, index)?;
    let status_set = status.is_set();

    let (confirmed, raw_value) = match property.dependency {
        Some(dep) => {
            let current = read_at(attrs, dev, dep.current_index)?;
            let limit = read_at(attrs, dev, dep.limit_index)?;
            let holds = dep.comparison.holds(
                numeric(&current, dep.current_index)?,
                numeric(&limit, dep.limit_index)?,
            );
            trace!(
                "{} property {}: {} {} {} -> {}",
                dev.obj, index, current, dep.comparison, limit, holds
            );
            (holds, current)
        }
        None => (status_set, status),
    };

    let alert_state = if confirmed {
        let code = irq_type.ok_or_else(|| LedgerError::ApiNotSupported {
            op: "irq_type",
            driver: dev.driver_name().to_string(),
        })?;
        code(index).ok_or(LedgerError::PropertyMissing { index })?
    } else if !status_set {
        AlertState::NoAlarmActive
    } else {
        warn!(
            "False trigger on {} property {} ({}): status set, threshold not met",
            dev.obj, index, property.name
        );
        return Ok(Verdict::FalseTrigger {
            property_index: index,
        });
    };

    Ok(Verdict::Event(AlertCallbackData {
        alert_state,
        property_index: index,
        raw_value,
    }))
}
