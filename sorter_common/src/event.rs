//! Event model shared by every node component.
//!
//! An [`Event`] is a discriminated [`EventKind`] plus an optional integer
//! payload. Events are `Copy` and travel by value through the bus, the
//! internal self-loop and the wire.
//!
//! `EventKind` codes are explicit and stable: they are the wire encoding and
//! the pulse code space. New kinds get new codes; existing codes never move.

use core::fmt;
use static_assertions::const_assert;

use crate::role::Side;

/// Payload sentinel meaning "no payload".
pub const NO_DATA: i32 = -1;

// ─── Event ──────────────────────────────────────────────────────────

/// The universal message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub data: i32,
}

impl Event {
    /// Event without payload.
    #[inline]
    pub const fn new(kind: EventKind) -> Self {
        Self { kind, data: NO_DATA }
    }

    /// Event carrying `data`.
    #[inline]
    pub const fn with_data(kind: EventKind, data: i32) -> Self {
        Self { kind, data }
    }

    /// Whether the payload differs from the [`NO_DATA`] sentinel.
    #[inline]
    pub const fn has_data(&self) -> bool {
        self.data != NO_DATA
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_data() {
            write!(f, "{} (data: {})", self.kind, self.data)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

// ─── EventKind ──────────────────────────────────────────────────────

/// Closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum EventKind {
    // Internal control
    StopThread = 1,

    // Connection lifecycle
    ConnectionLost = 2,
    ConnectionReestablished = 3,

    // Heartbeat
    HeartbeatMaster = 4,
    HeartbeatSlave = 5,

    // Master inputs
    LbStartMBlocked = 10,
    LbStartMUnblocked = 11,
    LbSwitchMBlocked = 12,
    LbSwitchMUnblocked = 13,
    LbEndMBlocked = 14,
    LbEndMUnblocked = 15,
    LbRampMBlocked = 16,
    LbRampMUnblocked = 17,
    StartMShort = 18,
    StartMLong = 19,
    StopMPressed = 20,
    ResetMPressed = 21,
    EStopMPressed = 22,
    EStopMReleased = 23,

    // Slave inputs
    LbStartSBlocked = 30,
    LbStartSUnblocked = 31,
    LbSwitchSBlocked = 32,
    LbSwitchSUnblocked = 33,
    LbEndSBlocked = 34,
    LbEndSUnblocked = 35,
    LbRampSBlocked = 36,
    LbRampSUnblocked = 37,
    StartSShort = 38,
    StartSLong = 39,
    StopSPressed = 40,
    ResetSPressed = 41,
    EStopSPressed = 42,
    EStopSReleased = 43,

    // Sensor results
    MetalMDetected = 50,
    HeightMSample = 51,
    MetalSDetected = 52,
    HeightSSample = 53,

    // Calibration requests
    CalMOffset = 60,
    CalMRef = 61,
    CalSOffset = 62,
    CalSRef = 63,

    // Error signals
    ErrorSelfSolvable = 70,
    ErrorNonSelfSolvable = 71,
    ErrorSelfSolved = 72,

    // Mode changed
    ModeStandby = 80,
    ModeRunning = 81,
    ModeService = 82,
    ModeError = 83,
    ModeEStop = 84,

    // Output commands: motors
    MotorMStop = 100,
    MotorMFast = 101,
    MotorMSlow = 102,
    MotorSStop = 103,
    MotorSFast = 104,
    MotorSSlow = 105,

    // Output commands: master lamps and LEDs
    LampMGreen = 110,
    LampMYellow = 111,
    LampMRed = 112,
    LedMStart = 113,
    LedMReset = 114,
    LedMQ1 = 115,
    LedMQ2 = 116,

    // Output commands: slave lamps and LEDs
    LampSGreen = 120,
    LampSYellow = 121,
    LampSRed = 122,
    LedSStart = 123,
    LedSReset = 124,
    LedSQ1 = 125,
    LedSQ2 = 126,

    // Output commands: sort gates
    SortM = 130,
    SortS = 131,
}

/// Number of event kinds.
pub const EVENT_KIND_COUNT: usize = 71;

// Codes travel as the 16-bit pulse code on the wire.
const_assert!((EventKind::SortS as i32) < u16::MAX as i32);

impl EventKind {
    /// Every kind, listed explicitly. "Subscribe to all" iterates this
    /// table, never a numeric range.
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = {
        use EventKind::*;
        [
            StopThread,
            ConnectionLost,
            ConnectionReestablished,
            HeartbeatMaster,
            HeartbeatSlave,
            LbStartMBlocked,
            LbStartMUnblocked,
            LbSwitchMBlocked,
            LbSwitchMUnblocked,
            LbEndMBlocked,
            LbEndMUnblocked,
            LbRampMBlocked,
            LbRampMUnblocked,
            StartMShort,
            StartMLong,
            StopMPressed,
            ResetMPressed,
            EStopMPressed,
            EStopMReleased,
            LbStartSBlocked,
            LbStartSUnblocked,
            LbSwitchSBlocked,
            LbSwitchSUnblocked,
            LbEndSBlocked,
            LbEndSUnblocked,
            LbRampSBlocked,
            LbRampSUnblocked,
            StartSShort,
            StartSLong,
            StopSPressed,
            ResetSPressed,
            EStopSPressed,
            EStopSReleased,
            MetalMDetected,
            HeightMSample,
            MetalSDetected,
            HeightSSample,
            CalMOffset,
            CalMRef,
            CalSOffset,
            CalSRef,
            ErrorSelfSolvable,
            ErrorNonSelfSolvable,
            ErrorSelfSolved,
            ModeStandby,
            ModeRunning,
            ModeService,
            ModeError,
            ModeEStop,
            MotorMStop,
            MotorMFast,
            MotorMSlow,
            MotorSStop,
            MotorSFast,
            MotorSSlow,
            LampMGreen,
            LampMYellow,
            LampMRed,
            LedMStart,
            LedMReset,
            LedMQ1,
            LedMQ2,
            LampSGreen,
            LampSYellow,
            LampSRed,
            LedSStart,
            LedSReset,
            LedSQ1,
            LedSQ2,
            SortM,
            SortS,
        ]
    };

    /// Stable numeric code (wire and pulse encoding).
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Convert from a raw code. Returns `None` for unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Lifecycle kinds that only make sense inside one node. They are never
    /// forwarded to the peer and never accepted from it.
    #[inline]
    pub const fn is_node_local(self) -> bool {
        matches!(
            self,
            Self::StopThread | Self::ConnectionLost | Self::ConnectionReestablished
        )
    }

    /// Decode a button or light-barrier kind into a structured input.
    pub const fn input(self) -> Option<Input> {
        use EventKind::*;
        use Side::{Master as M, Slave as S};
        let (side, signal) = match self {
            LbStartMBlocked => (M, Signal::Barrier(Barrier::Start, true)),
            LbStartMUnblocked => (M, Signal::Barrier(Barrier::Start, false)),
            LbSwitchMBlocked => (M, Signal::Barrier(Barrier::Switch, true)),
            LbSwitchMUnblocked => (M, Signal::Barrier(Barrier::Switch, false)),
            LbEndMBlocked => (M, Signal::Barrier(Barrier::End, true)),
            LbEndMUnblocked => (M, Signal::Barrier(Barrier::End, false)),
            LbRampMBlocked => (M, Signal::Barrier(Barrier::Ramp, true)),
            LbRampMUnblocked => (M, Signal::Barrier(Barrier::Ramp, false)),
            StartMShort => (M, Signal::StartShort),
            StartMLong => (M, Signal::StartLong),
            StopMPressed => (M, Signal::Stop),
            ResetMPressed => (M, Signal::Reset),
            EStopMPressed => (M, Signal::EStopPressed),
            EStopMReleased => (M, Signal::EStopReleased),
            LbStartSBlocked => (S, Signal::Barrier(Barrier::Start, true)),
            LbStartSUnblocked => (S, Signal::Barrier(Barrier::Start, false)),
            LbSwitchSBlocked => (S, Signal::Barrier(Barrier::Switch, true)),
            LbSwitchSUnblocked => (S, Signal::Barrier(Barrier::Switch, false)),
            LbEndSBlocked => (S, Signal::Barrier(Barrier::End, true)),
            LbEndSUnblocked => (S, Signal::Barrier(Barrier::End, false)),
            LbRampSBlocked => (S, Signal::Barrier(Barrier::Ramp, true)),
            LbRampSUnblocked => (S, Signal::Barrier(Barrier::Ramp, false)),
            StartSShort => (S, Signal::StartShort),
            StartSLong => (S, Signal::StartLong),
            StopSPressed => (S, Signal::Stop),
            ResetSPressed => (S, Signal::Reset),
            EStopSPressed => (S, Signal::EStopPressed),
            EStopSReleased => (S, Signal::EStopReleased),
            _ => return None,
        };
        Some(Input { side, signal })
    }

    /// Light-barrier kind for `side`/`barrier`.
    pub const fn barrier(side: Side, barrier: Barrier, blocked: bool) -> Self {
        use EventKind::*;
        match (side, barrier, blocked) {
            (Side::Master, Barrier::Start, true) => LbStartMBlocked,
            (Side::Master, Barrier::Start, false) => LbStartMUnblocked,
            (Side::Master, Barrier::Switch, true) => LbSwitchMBlocked,
            (Side::Master, Barrier::Switch, false) => LbSwitchMUnblocked,
            (Side::Master, Barrier::End, true) => LbEndMBlocked,
            (Side::Master, Barrier::End, false) => LbEndMUnblocked,
            (Side::Master, Barrier::Ramp, true) => LbRampMBlocked,
            (Side::Master, Barrier::Ramp, false) => LbRampMUnblocked,
            (Side::Slave, Barrier::Start, true) => LbStartSBlocked,
            (Side::Slave, Barrier::Start, false) => LbStartSUnblocked,
            (Side::Slave, Barrier::Switch, true) => LbSwitchSBlocked,
            (Side::Slave, Barrier::Switch, false) => LbSwitchSUnblocked,
            (Side::Slave, Barrier::End, true) => LbEndSBlocked,
            (Side::Slave, Barrier::End, false) => LbEndSUnblocked,
            (Side::Slave, Barrier::Ramp, true) => LbRampSBlocked,
            (Side::Slave, Barrier::Ramp, false) => LbRampSUnblocked,
        }
    }

    /// Button/e-stop kind for `side`. Barrier signals map to their
    /// light-barrier kind.
    pub const fn signal(side: Side, signal: Signal) -> Self {
        use EventKind::*;
        match (side, signal) {
            (_, Signal::Barrier(b, blocked)) => Self::barrier(side, b, blocked),
            (Side::Master, Signal::StartShort) => StartMShort,
            (Side::Master, Signal::StartLong) => StartMLong,
            (Side::Master, Signal::Stop) => StopMPressed,
            (Side::Master, Signal::Reset) => ResetMPressed,
            (Side::Master, Signal::EStopPressed) => EStopMPressed,
            (Side::Master, Signal::EStopReleased) => EStopMReleased,
            (Side::Slave, Signal::StartShort) => StartSShort,
            (Side::Slave, Signal::StartLong) => StartSLong,
            (Side::Slave, Signal::Stop) => StopSPressed,
            (Side::Slave, Signal::Reset) => ResetSPressed,
            (Side::Slave, Signal::EStopPressed) => EStopSPressed,
            (Side::Slave, Signal::EStopReleased) => EStopSReleased,
        }
    }

    /// Motor command kind for `side`.
    pub const fn motor(side: Side, command: MotorCommand) -> Self {
        use EventKind::*;
        match (side, command) {
            (Side::Master, MotorCommand::Stop) => MotorMStop,
            (Side::Master, MotorCommand::Fast) => MotorMFast,
            (Side::Master, MotorCommand::Slow) => MotorMSlow,
            (Side::Slave, MotorCommand::Stop) => MotorSStop,
            (Side::Slave, MotorCommand::Fast) => MotorSFast,
            (Side::Slave, MotorCommand::Slow) => MotorSSlow,
        }
    }

    /// Lamp/LED kind for `side`.
    pub const fn lamp(side: Side, lamp: Lamp) -> Self {
        use EventKind::*;
        match (side, lamp) {
            (Side::Master, Lamp::Green) => LampMGreen,
            (Side::Master, Lamp::Yellow) => LampMYellow,
            (Side::Master, Lamp::Red) => LampMRed,
            (Side::Master, Lamp::LedStart) => LedMStart,
            (Side::Master, Lamp::LedReset) => LedMReset,
            (Side::Master, Lamp::LedQ1) => LedMQ1,
            (Side::Master, Lamp::LedQ2) => LedMQ2,
            (Side::Slave, Lamp::Green) => LampSGreen,
            (Side::Slave, Lamp::Yellow) => LampSYellow,
            (Side::Slave, Lamp::Red) => LampSRed,
            (Side::Slave, Lamp::LedStart) => LedSStart,
            (Side::Slave, Lamp::LedReset) => LedSReset,
            (Side::Slave, Lamp::LedQ1) => LedSQ1,
            (Side::Slave, Lamp::LedQ2) => LedSQ2,
        }
    }

    /// Sort-gate kind for `side`.
    pub const fn sort_gate(side: Side) -> Self {
        match side {
            Side::Master => Self::SortM,
            Side::Slave => Self::SortS,
        }
    }

    /// Calibration request kind for `side`.
    pub const fn calibration(side: Side, kind: CalibrationKind) -> Self {
        use EventKind::*;
        match (side, kind) {
            (Side::Master, CalibrationKind::Offset) => CalMOffset,
            (Side::Master, CalibrationKind::Reference) => CalMRef,
            (Side::Slave, CalibrationKind::Offset) => CalSOffset,
            (Side::Slave, CalibrationKind::Reference) => CalSRef,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<i32> for EventKind {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

// ─── Structured inputs ──────────────────────────────────────────────

/// Light-barrier positions along one belt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Barrier {
    /// Workpiece insertion at the start of the belt.
    Start = 0,
    /// In front of the sort gate.
    Switch = 1,
    /// End of the belt.
    End = 2,
    /// Ramp collecting sorted-out workpieces.
    Ramp = 3,
}

impl Barrier {
    pub const ALL: [Barrier; 4] = [Self::Start, Self::Switch, Self::End, Self::Ramp];
}

/// Operator or sensor signal decoded from an input kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Light barrier changed; `true` = blocked.
    Barrier(Barrier, bool),
    StartShort,
    StartLong,
    Stop,
    Reset,
    EStopPressed,
    EStopReleased,
}

/// An input signal together with the belt side it originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Input {
    pub side: Side,
    pub signal: Signal,
}

// ─── Output payloads ────────────────────────────────────────────────

/// Motor command family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorCommand {
    Stop,
    Fast,
    Slow,
}

/// Lamps and LEDs present on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lamp {
    Green,
    Yellow,
    Red,
    LedStart,
    LedReset,
    LedQ1,
    LedQ2,
}

impl Lamp {
    pub const ALL: [Lamp; 7] = [
        Self::Green,
        Self::Yellow,
        Self::Red,
        Self::LedStart,
        Self::LedReset,
        Self::LedQ1,
        Self::LedQ2,
    ];
}

/// Lamp payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LampState {
    Off = 0,
    On = 1,
    Blink = 2,
}

/// Sort-gate payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SortGate {
    /// Workpiece sorted out to the ramp.
    Out = 0,
    /// Workpiece passes to the end of the belt.
    Pass = 1,
}

/// Height-sensor calibration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationKind {
    Offset,
    Reference,
}
