//! System-wide constants for the sorter workspace.
//!
//! Single source of truth for timing defaults, service names and device
//! calibration defaults.

/// Service endpoint attached by the master node.
pub const MASTER_SERVICE_NAME: &str = "sorter_master";

/// Service endpoint attached by the slave node.
pub const SLAVE_SERVICE_NAME: &str = "sorter_slave";

/// Default directory holding the service endpoints.
pub const DEFAULT_SERVICE_DIR: &str = "/tmp/sorter";

/// Default node configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sorter/node.toml";

/// Default machine settings file (`KEY=VALUE`).
pub const DEFAULT_SETTINGS_FILE: &str = "/etc/sorter/settings.conf";

/// Interval between peer rendezvous attempts.
pub const CONNECT_RETRY_MS: u64 = 1000;

/// Upper bound for a single send/acknowledge exchange with the peer.
pub const PEER_IO_TIMEOUT_MS: u64 = 500;

/// Interval at which the watchdog emits this node's heartbeat.
pub const WD_SEND_INTERVAL_MS: u64 = 2000;

/// Interval at which the watchdog checks the peer heartbeat age.
pub const WD_CHECK_INTERVAL_MS: u64 = 1000;

/// Peer heartbeat age above which the peer is considered stale.
pub const WD_TIMEOUT_MS: u64 = 5000;

/// Height-sensor ADC value with an empty belt.
pub const ADC_DEFAULT_OFFSET: i32 = 3620;

/// Height-sensor ADC value at the reference height.
pub const ADC_DEFAULT_REF: i32 = 2520;

/// ADC counts per millimetre of workpiece height.
pub const ADC_PER_MILLIMETRE: i32 = 50;
