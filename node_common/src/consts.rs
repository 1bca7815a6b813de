//! Node HAL constants.

/// Canonical service name (used for logging and thread naming).
pub const HAL_SERVICE_NAME: &str = "node_hal";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/node/ledger.toml";

/// Default interval between cancellation checks of a monitor thread [ms].
pub const DEFAULT_IRQ_POLL_MS: u64 = 100;

/// Upper bound for `irq_poll_ms` [ms].
pub const MAX_IRQ_POLL_MS: u64 = 60_000;

/// Root of the legacy GPIO sysfs interface.
pub const GPIO_SYSFS_ROOT: &str = "/sys/class/gpio";
