//! Actuation boundary of the mode machine.
//!
//! The machine never touches hardware. It calls [`MainActions`]; the
//! production implementation [`BusActions`] turns every call into an
//! output-command event on the self-loop for the node's own side.

use sorter_common::event::{
    CalibrationKind, Event, EventKind, Lamp, LampState, MotorCommand, SortGate,
};
use sorter_common::mode::OperatingMode;
use sorter_common::role::{Role, Side};
use sorter_ipc::EventHandler;
use tracing::debug;

/// Commands issued by the mode machine.
pub trait MainActions {
    /// Stop (`true`) or release (`false`) the own conveyor.
    fn set_motor_stop(&mut self, stop: bool);

    /// Fast (`true`) or slow (`false`) speed for the own conveyor.
    fn set_motor_fast(&mut self, fast: bool);

    fn set_running_mode(&mut self) {
        self.set_mode(OperatingMode::Running);
    }

    /// Mode indicator; publishes the mode-changed notification.
    fn set_mode(&mut self, mode: OperatingMode);

    fn set_lamp(&mut self, side: Side, lamp: Lamp, state: LampState);

    fn set_sort_gate(&mut self, side: Side, gate: SortGate);

    /// Drive either conveyor directly (service-mode self-test).
    fn drive_conveyor(&mut self, side: Side, command: MotorCommand);

    /// Ask the own height sensor to calibrate.
    fn request_calibration(&mut self, kind: CalibrationKind);
}

/// [`MainActions`] over an [`EventHandler`].
pub struct BusActions<H> {
    side: Side,
    handler: H,
}

impl<H: EventHandler> BusActions<H> {
    pub fn new(role: Role, handler: H) -> Self {
        Self {
            side: role.side(),
            handler,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn emit(&self, event: Event) {
        debug!("Action {event}");
        self.handler.handle_event(event);
    }
}

impl<H: EventHandler> MainActions for BusActions<H> {
    fn set_motor_stop(&mut self, stop: bool) {
        self.emit(Event::with_data(
            EventKind::motor(self.side, MotorCommand::Stop),
            i32::from(stop),
        ));
    }

    fn set_motor_fast(&mut self, fast: bool) {
        let command = if fast {
            MotorCommand::Fast
        } else {
            MotorCommand::Slow
        };
        self.emit(Event::with_data(EventKind::motor(self.side, command), 1));
    }

    fn set_mode(&mut self, mode: OperatingMode) {
        self.emit(Event::new(mode.notification()));
    }

    fn set_lamp(&mut self, side: Side, lamp: Lamp, state: LampState) {
        self.emit(Event::with_data(EventKind::lamp(side, lamp), state as i32));
    }

    fn set_sort_gate(&mut self, side: Side, gate: SortGate) {
        self.emit(Event::with_data(EventKind::sort_gate(side), gate as i32));
    }

    fn drive_conveyor(&mut self, side: Side, command: MotorCommand) {
        self.emit(Event::with_data(EventKind::motor(side, command), 1));
    }

    fn request_calibration(&mut self, kind: CalibrationKind) {
        self.emit(Event::new(EventKind::calibration(self.side, kind)));
    }
}
