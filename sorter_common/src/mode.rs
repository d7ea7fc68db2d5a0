//! Operating modes of the sorting machine.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::event::EventKind;

/// Externally visible operating mode. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperatingMode {
    /// Idle, belts stopped.
    #[default]
    Standby = 0,
    /// Sorting workpieces.
    Running = 1,
    /// Calibration and self-test sequence.
    ServiceMode = 2,
    /// Fault pending operator or subsystem resolution.
    Error = 3,
    /// Emergency stop engaged.
    EStop = 4,
}

impl OperatingMode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Standby),
            1 => Some(Self::Running),
            2 => Some(Self::ServiceMode),
            3 => Some(Self::Error),
            4 => Some(Self::EStop),
            _ => None,
        }
    }

    /// Mode-changed notification published when this mode is entered.
    pub const fn notification(self) -> EventKind {
        match self {
            Self::Standby => EventKind::ModeStandby,
            Self::Running => EventKind::ModeRunning,
            Self::ServiceMode => EventKind::ModeService,
            Self::Error => EventKind::ModeError,
            Self::EStop => EventKind::ModeEStop,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
