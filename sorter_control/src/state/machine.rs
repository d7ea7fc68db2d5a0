//! Mode state machine.
//!
//! Standby ↔ Running, Standby → ServiceMode → Standby, any → Error/EStop →
//! Standby. The machine is driven only by bus events through
//! [`ModeMachine::handle`] and acts only through [`MainActions`].
//!
//! Each mode declares the event kinds it reacts to ([`interests`]). Events
//! outside that table are ignored without touching any state. On a mode
//! change the old mode's exit runs before the new mode's entry.

use parking_lot::Mutex;
use sorter_common::event::{
    Barrier, CalibrationKind, Event, EventKind, Input, Lamp, LampState, MotorCommand, Signal,
    SortGate,
};
use sorter_common::mode::OperatingMode;
use sorter_common::role::{Role, Side};
use sorter_ipc::{EventBus, SubscriptionId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::actions::MainActions;
use crate::state::error::{ErrorContext, ErrorKind};
use crate::state::estop::EStopContext;
use crate::state::service::{SensorChecklist, ServiceStep};
use crate::workpieces::WorkpieceRegistry;

// ─── Mode ───────────────────────────────────────────────────────────

/// Active mode with its context. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standby,
    Running {
        /// Ramp light barrier state, indexed by [`Side::index`].
        ramp_blocked: [bool; 2],
    },
    ServiceMode(ServiceStep),
    Error(ErrorContext),
    EStop(EStopContext),
}

impl Mode {
    fn running() -> Self {
        Self::Running {
            ramp_blocked: [false; 2],
        }
    }

    pub const fn kind(&self) -> OperatingMode {
        match self {
            Self::Standby => OperatingMode::Standby,
            Self::Running { .. } => OperatingMode::Running,
            Self::ServiceMode(_) => OperatingMode::ServiceMode,
            Self::Error(_) => OperatingMode::Error,
            Self::EStop(_) => OperatingMode::EStop,
        }
    }
}

/// Result of [`ModeMachine::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Ignored,
}

// ─── Interest tables ────────────────────────────────────────────────

use EventKind::*;

const STANDBY_INTERESTS: &[EventKind] = &[
    StartMShort,
    StartSShort,
    StartMLong,
    StartSLong,
    EStopMPressed,
    EStopSPressed,
];

const RUNNING_INTERESTS: &[EventKind] = &[
    LbStartMBlocked,
    LbStartMUnblocked,
    LbSwitchMBlocked,
    LbSwitchMUnblocked,
    LbEndMBlocked,
    LbEndMUnblocked,
    LbRampMBlocked,
    LbRampMUnblocked,
    LbStartSBlocked,
    LbStartSUnblocked,
    LbSwitchSBlocked,
    LbSwitchSUnblocked,
    LbEndSBlocked,
    LbEndSUnblocked,
    LbRampSBlocked,
    LbRampSUnblocked,
    StopMPressed,
    StopSPressed,
    EStopMPressed,
    EStopSPressed,
    ErrorSelfSolvable,
    ErrorNonSelfSolvable,
];

const SERVICE_INTERESTS: &[EventKind] = &[
    StartMShort,
    StartSShort,
    StopMPressed,
    StopSPressed,
    ResetMPressed,
    ResetSPressed,
    EStopMPressed,
    EStopSPressed,
    LbStartMBlocked,
    LbSwitchMBlocked,
    LbEndMBlocked,
    LbRampMBlocked,
    LbStartSBlocked,
    LbSwitchSBlocked,
    LbEndSBlocked,
    LbRampSBlocked,
];

const ERROR_INTERESTS: &[EventKind] = &[
    ResetMPressed,
    ResetSPressed,
    StartMShort,
    StartSShort,
    ErrorSelfSolved,
    EStopMPressed,
    EStopSPressed,
];

const ESTOP_INTERESTS: &[EventKind] = &[
    EStopMPressed,
    EStopSPressed,
    EStopMReleased,
    EStopSReleased,
    ResetMPressed,
    ResetSPressed,
];

/// Event kinds `mode` reacts to.
pub const fn interests(mode: OperatingMode) -> &'static [EventKind] {
    match mode {
        OperatingMode::Standby => STANDBY_INTERESTS,
        OperatingMode::Running => RUNNING_INTERESTS,
        OperatingMode::ServiceMode => SERVICE_INTERESTS,
        OperatingMode::Error => ERROR_INTERESTS,
        OperatingMode::EStop => ESTOP_INTERESTS,
    }
}

/// Union of all interest tables, sorted and without duplicates.
pub fn subscriptions() -> Vec<EventKind> {
    let mut kinds: Vec<EventKind> = [
        STANDBY_INTERESTS,
        RUNNING_INTERESTS,
        SERVICE_INTERESTS,
        ERROR_INTERESTS,
        ESTOP_INTERESTS,
    ]
    .concat();
    kinds.sort_unstable();
    kinds.dedup();
    kinds
}

// ─── Machine ────────────────────────────────────────────────────────

pub struct ModeMachine<A> {
    role: Role,
    mode: Mode,
    actions: A,
    workpieces: WorkpieceRegistry,
}

impl<A: MainActions> ModeMachine<A> {
    /// Create the machine in Standby and run Standby's entry.
    pub fn new(role: Role, actions: A) -> Self {
        let mut machine = Self {
            role,
            mode: Mode::Standby,
            actions,
            workpieces: WorkpieceRegistry::default(),
        };
        machine.entry();
        machine
    }

    #[inline]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[inline]
    pub fn kind(&self) -> OperatingMode {
        self.mode.kind()
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut A {
        &mut self.actions
    }

    pub fn workpieces(&self) -> &WorkpieceRegistry {
        &self.workpieces
    }

    /// Single entry point for bus events.
    pub fn handle(&mut self, event: Event) -> Outcome {
        let current = self.mode.kind();
        if !interests(current).contains(&event.kind) {
            debug!("{current} ignores {event}");
            return Outcome::Ignored;
        }
        debug!("{current} handles {event}");

        let input = event.kind.input();
        let next = match input {
            Some(Input {
                side,
                signal: Signal::EStopPressed,
            }) if current != OperatingMode::EStop => Some(Mode::EStop(EStopContext::pressed(side))),
            _ => match current {
                OperatingMode::Standby => input.and_then(|i| self.on_standby(i)),
                OperatingMode::Running => self.on_running(event.kind, input),
                OperatingMode::ServiceMode => input.and_then(|i| self.on_service(i)),
                OperatingMode::Error => self.on_error(event.kind, input),
                OperatingMode::EStop => input.and_then(|i| self.on_estop(i)),
            },
        };

        if let Some(next) = next {
            self.transition(next);
        }
        Outcome::Handled
    }

    fn transition(&mut self, next: Mode) {
        let from = self.mode.kind();
        self.exit();
        self.mode = next;
        info!("Mode {} -> {}", from, self.mode.kind());
        self.entry();
    }

    fn entry(&mut self) {
        match self.mode.kind() {
            OperatingMode::Running => {
                self.actions.set_running_mode();
                self.actions.set_motor_stop(false);
                self.actions.set_motor_fast(false);
            }
            mode => {
                self.actions.set_mode(mode);
                self.actions.set_motor_stop(true);
            }
        }
    }

    fn exit(&mut self) {
        if self.mode == Mode::ServiceMode(ServiceStep::SelftestActuators) {
            self.all_actuators(LampState::Off, SortGate::Pass);
        }
    }

    // ─── Standby ────────────────────────────────────────────────────

    fn on_standby(&mut self, input: Input) -> Option<Mode> {
        match input.signal {
            Signal::StartShort => Some(Mode::running()),
            Signal::StartLong => Some(Mode::ServiceMode(ServiceStep::CalibrateOffset)),
            _ => None,
        }
    }

    // ─── Running ────────────────────────────────────────────────────

    fn on_running(&mut self, kind: EventKind, input: Option<Input>) -> Option<Mode> {
        match kind {
            ErrorSelfSolvable => return Some(Mode::Error(ErrorContext::new(ErrorKind::SelfSolvable))),
            ErrorNonSelfSolvable => {
                return Some(Mode::Error(ErrorContext::new(ErrorKind::NonSelfSolvable)));
            }
            _ => {}
        }

        // Belt traffic is driven by the master's barriers on both nodes; the
        // slave's barriers only update the ramp flags.
        let Input { side, signal } = input?;
        let master = side == Side::Master;
        match signal {
            Signal::Stop => return Some(Mode::Standby),
            Signal::Barrier(Barrier::Start, true) if master => {
                let id = self.workpieces.create();
                info!("Workpiece {id} entered the belt");
                self.actions.set_motor_fast(true);
            }
            Signal::Barrier(Barrier::End, blocked) if master => {
                self.actions.set_motor_stop(blocked);
            }
            Signal::Barrier(Barrier::Ramp, blocked) => {
                if let Mode::Running { ramp_blocked } = &mut self.mode {
                    ramp_blocked[side.index()] = blocked;
                }
                if master && blocked {
                    self.actions.set_motor_fast(false);
                }
            }
            _ => {}
        }
        None
    }

    // ─── ServiceMode ────────────────────────────────────────────────

    fn on_service(&mut self, input: Input) -> Option<Mode> {
        match input.signal {
            Signal::Stop => Some(Mode::Standby),
            Signal::StartShort => self.advance_service(),
            Signal::Reset => {
                debug!("Reset has no effect in service mode");
                None
            }
            Signal::Barrier(barrier, true) => {
                self.check_sensor(input.side, barrier);
                None
            }
            _ => None,
        }
    }

    fn advance_service(&mut self) -> Option<Mode> {
        let Mode::ServiceMode(step) = &mut self.mode else {
            return None;
        };
        match *step {
            ServiceStep::CalibrateOffset => {
                *step = ServiceStep::CalibrateReference;
                self.actions.request_calibration(CalibrationKind::Offset);
            }
            ServiceStep::CalibrateReference => {
                *step = ServiceStep::SelftestSensors(SensorChecklist::default());
                self.actions.request_calibration(CalibrationKind::Reference);
            }
            ServiceStep::SelftestSensors(list) => {
                if !list.is_complete() {
                    warn!("Sensor self-test incomplete: {} barriers missing", list.missing());
                    return None;
                }
                *step = ServiceStep::SelftestActuators;
                self.all_actuators(LampState::On, SortGate::Out);
            }
            ServiceStep::SelftestActuators => return Some(Mode::Standby),
        }
        info!("Service step {:?}", self.mode);
        None
    }

    fn check_sensor(&mut self, side: Side, barrier: Barrier) {
        let Mode::ServiceMode(ServiceStep::SelftestSensors(list)) = &mut self.mode else {
            return;
        };
        if list.mark(side, barrier) {
            info!("Sensor self-test: {side} {barrier:?} barrier ok");
        }
        match barrier {
            Barrier::Start => self.actions.drive_conveyor(side, MotorCommand::Slow),
            Barrier::End => self.actions.drive_conveyor(side, MotorCommand::Stop),
            _ => {}
        }
    }

    fn all_actuators(&mut self, lamps: LampState, gate: SortGate) {
        for side in Side::BOTH {
            for lamp in Lamp::ALL {
                self.actions.set_lamp(side, lamp, lamps);
            }
            self.actions.set_sort_gate(side, gate);
        }
    }

    // ─── Error ──────────────────────────────────────────────────────

    fn on_error(&mut self, kind: EventKind, input: Option<Input>) -> Option<Mode> {
        let Mode::Error(ctx) = &mut self.mode else {
            return None;
        };
        let cleared = if kind == ErrorSelfSolved {
            ctx.on_self_solved();
            false
        } else {
            match input.map(|i| i.signal) {
                Some(Signal::Reset) => ctx.on_reset(),
                Some(Signal::StartShort) => ctx.on_start(),
                _ => false,
            }
        };
        cleared.then_some(Mode::Standby)
    }

    // ─── EStop ──────────────────────────────────────────────────────

    fn on_estop(&mut self, input: Input) -> Option<Mode> {
        let Mode::EStop(ctx) = &mut self.mode else {
            return None;
        };
        match input.signal {
            Signal::EStopPressed => ctx.press(input.side),
            Signal::EStopReleased => ctx.release(input.side),
            Signal::Reset => {
                if !ctx.reset(input.side) {
                    debug!("Reset ignored while an e-stop is pressed");
                }
            }
            _ => {}
        }
        ctx.can_leave().then_some(Mode::Standby)
    }
}

// ─── Bus wiring ─────────────────────────────────────────────────────

/// Subscribe `machine` to every kind it may react to.
///
/// Returns the shared machine and the subscriptions made.
pub fn attach<A>(
    machine: ModeMachine<A>,
    bus: &EventBus,
) -> (Arc<Mutex<ModeMachine<A>>>, Vec<(EventKind, SubscriptionId)>)
where
    A: MainActions + Send + 'static,
{
    let shared = Arc::new(Mutex::new(machine));
    let subs = subscriptions()
        .into_iter()
        .map(|kind| {
            let machine = Arc::clone(&shared);
            let id = bus.subscribe(kind, move |event| {
                machine.lock().handle(*event);
            });
            (kind, id)
        })
        .collect();
    (shared, subs)
}
