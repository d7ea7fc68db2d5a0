//! Prelude module for common re-exports.
//!
//! ```rust
//! use sorter_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, NodeConfig, SharedConfig, WatchdogConfig};
pub use crate::settings::{Calibration, MachineSettings, NodeSettings};

// ─── Events ─────────────────────────────────────────────────────────
pub use crate::event::{
    Barrier, CalibrationKind, Event, EventKind, Input, Lamp, LampState, MotorCommand, NO_DATA,
    Signal, SortGate,
};

// ─── Node identity and modes ────────────────────────────────────────
pub use crate::mode::OperatingMode;
pub use crate::role::{Role, Side};

// ─── Health ─────────────────────────────────────────────────────────
pub use crate::watchdog::HealthStatus;

// ─── Workpieces ─────────────────────────────────────────────────────
pub use crate::workpiece::{Workpiece, WorkpieceStatus, WorkpieceType};
