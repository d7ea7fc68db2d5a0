//! Shared fixtures for the mode-machine scenarios.

mod bus_wiring;
mod error_recovery;
mod estop;
mod modes;
mod running;
mod service_mode;

use parking_lot::Mutex;
use sorter_common::event::{Event, EventKind};
use sorter_common::role::Role;
use sorter_control::{BusActions, ModeMachine};
use sorter_ipc::EventHandler;
use std::sync::Arc;

/// Records every command the machine emits.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<Event>>);

impl EventHandler for Recorder {
    fn handle_event(&self, event: Event) {
        self.0.lock().push(event);
    }
}

pub type Machine = ModeMachine<BusActions<Arc<Recorder>>>;

pub fn machine(role: Role) -> Machine {
    ModeMachine::new(role, BusActions::new(role, Arc::new(Recorder::default())))
}

/// Feed a sequence of payload-less events.
pub fn feed(m: &mut Machine, kinds: &[EventKind]) {
    for &kind in kinds {
        m.handle(Event::new(kind));
    }
}

/// Take the recorded commands.
pub fn drain(m: &Machine) -> Vec<Event> {
    std::mem::take(&mut *m.actions().handler().0.lock())
}
