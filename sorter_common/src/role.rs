//! Node role and belt side.
//!
//! The role is fixed at startup. It decides which service endpoint this
//! node attaches, which peer endpoint it connects to, and which heartbeat
//! kind is "mine" versus the peer's.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::consts::{MASTER_SERVICE_NAME, SLAVE_SERVICE_NAME};
use crate::event::EventKind;

// ─── Side ───────────────────────────────────────────────────────────

/// Physical half of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    Master = 0,
    Slave = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Self::Master, Self::Slave];

    /// Index for per-side arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::Master => Self::Slave,
            Self::Slave => Self::Master,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Slave => write!(f, "slave"),
        }
    }
}

// ─── Role ───────────────────────────────────────────────────────────

/// Role of this node process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Master,
    Slave,
}

impl Role {
    /// Belt side this node drives.
    #[inline]
    pub const fn side(self) -> Side {
        match self {
            Self::Master => Side::Master,
            Self::Slave => Side::Slave,
        }
    }

    /// Service name this node attaches.
    pub const fn local_service(self) -> &'static str {
        match self {
            Self::Master => MASTER_SERVICE_NAME,
            Self::Slave => SLAVE_SERVICE_NAME,
        }
    }

    /// Service name of the peer node.
    pub const fn peer_service(self) -> &'static str {
        match self {
            Self::Master => SLAVE_SERVICE_NAME,
            Self::Slave => MASTER_SERVICE_NAME,
        }
    }

    /// Heartbeat kind this node emits.
    pub const fn own_heartbeat(self) -> EventKind {
        match self {
            Self::Master => EventKind::HeartbeatMaster,
            Self::Slave => EventKind::HeartbeatSlave,
        }
    }

    /// Heartbeat kind the peer emits.
    pub const fn peer_heartbeat(self) -> EventKind {
        match self {
            Self::Master => EventKind::HeartbeatSlave,
            Self::Slave => EventKind::HeartbeatMaster,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.side().fmt(f)
    }
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "master" | "m" => Ok(Self::Master),
            "slave" | "s" => Ok(Self::Slave),
            _ => Err(format!("unknown role: {s:?}, expected \"master\" or \"slave\"")),
        }
    }
}
