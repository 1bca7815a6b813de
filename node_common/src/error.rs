//! Error kinds shared by the ledger, the dispatch helper and the
//! interrupt registry.

use crate::property::DataType;
use std::path::PathBuf;
use thiserror::Error;

/// Error kinds reported by ledger-level operations.
///
/// None of these are fatal: a missing device, an unsupported slot or an
/// unavailable property is an ordinary outcome for the single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No registered device matches the given identity.
    #[error("Device not registered: {0}")]
    DeviceMissing(String),

    /// Device has no bound driver table, or the table lacks `init`.
    #[error("No driver bound for device: {0}")]
    DriverMissing(String),

    /// Unknown device-type name, or the operation slot is absent.
    #[error("Operation '{op}' not supported by '{driver}'")]
    ApiNotSupported {
        /// Operation slot name
        op: &'static str,
        /// Driver (or device) name
        driver: String,
    },

    /// Property index out of range or marked not-available on this revision.
    #[error("Property {index} not available")]
    PropertyMissing {
        /// Property index
        index: usize,
    },

    /// Property resolves to no attribute path or handle.
    #[error("No attribute target for property {index}")]
    AttributeMissing {
        /// Property index
        index: usize,
    },

    /// Container had no element matching the removal key.
    #[error("List removal failed")]
    ListRemovalFailed,

    /// Monitor thread (or its signal line) could not be started.
    #[error("Failed to create monitor thread: {0}")]
    ThreadCreateFailed(String),

    /// Monitor thread could not be stopped; the entry is retained.
    #[error("Failed to cancel monitor thread: {0}")]
    ThreadCancelFailed(String),

    /// A required collaborator reference was absent.
    #[error("Missing required reference: {0}")]
    InvalidPointer(&'static str),

    /// No interrupt entry exists for the source.
    #[error("No IRQ registered for {0}")]
    IrqNotRegistered(String),

    /// Property table inconsistent with its own dependency indices.
    #[error("Invalid property table: {0}")]
    PropertyTableInvalid(String),

    /// Typed attribute access failed.
    #[error(transparent)]
    Attribute(#[from] AttrError),
}

/// Errors reported by an attribute accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrError {
    /// Attribute file does not exist
    #[error("Attribute not found: {0:?}")]
    NotFound(PathBuf),

    /// I/O failure while reading or writing
    #[error("Attribute I/O error on {path:?}: {reason}")]
    Io {
        /// Attribute path
        path: PathBuf,
        /// OS error text
        reason: String,
    },

    /// Attribute content does not parse as the expected type
    #[error("Cannot parse {text:?} from {path:?} as {data_type}")]
    Parse {
        /// Attribute path
        path: PathBuf,
        /// Raw attribute text
        text: String,
        /// Expected data type
        data_type: DataType,
    },

    /// Value has no textual attribute representation
    #[error("{data_type} values cannot be written to attributes")]
    Unrepresentable {
        /// Offending data type
        data_type: DataType,
    },
}
