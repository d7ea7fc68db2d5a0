//! Workpiece record.
//!
//! Plain data holder filled in by the sensor collaborators as a workpiece
//! travels along both belts.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Workpiece classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkpieceType {
    /// Flat workpiece.
    F,
    /// Bore on top, with metal insert.
    Bom,
    /// Bore on top, without metal insert.
    Bum,
    /// Bore on top, no insert detected yet (upside-down candidate).
    Ob,
    #[default]
    Unknown,
}

impl WorkpieceType {
    /// Settings-file token, `None` for [`WorkpieceType::Unknown`].
    pub const fn token(self) -> Option<&'static str> {
        match self {
            Self::F => Some("F"),
            Self::Bom => Some("BOM"),
            Self::Bum => Some("BUM"),
            Self::Ob => Some("OB"),
            Self::Unknown => None,
        }
    }
}

impl FromStr for WorkpieceType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F" => Ok(Self::F),
            "BOM" => Ok(Self::Bom),
            "BUM" => Ok(Self::Bum),
            "OB" => Ok(Self::Ob),
            _ => Err(format!("unknown workpiece type: {s:?}")),
        }
    }
}

impl fmt::Display for WorkpieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token().unwrap_or("UNKNOWN"))
    }
}

/// Position of a workpiece along the two belts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkpieceStatus {
    /// Master belt: between start and height measurement.
    #[default]
    MasterStartToHeight,
    MasterHeightToMetal,
    MasterMetalToSwitch,
    MasterSwitchToRamp,
    MasterSwitchToEnd,
    /// Slave belt: between start and height measurement.
    SlaveStartToHeight,
    SlaveHeightToMetal,
    SlaveMetalToSwitch,
    SlaveSwitchToRamp,
    SlaveSwitchToEnd,
}

/// A single workpiece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workpiece {
    pub id: u32,
    pub kind: WorkpieceType,
    pub status: WorkpieceStatus,
    /// Average height measured on the master belt, in millimetres.
    pub avg_height_master: f32,
    pub metal_master: bool,
    /// Maximum height measured on the slave belt, in millimetres.
    pub max_height_slave: f32,
    pub metal_slave: bool,
    pub flipped: bool,
}

impl Workpiece {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            kind: WorkpieceType::Unknown,
            status: WorkpieceStatus::default(),
            avg_height_master: 0.0,
            metal_master: false,
            max_height_slave: 0.0,
            metal_slave: false,
            flipped: false,
        }
    }
}
