//! Integration test: machine driven through an event bus.

use parking_lot::Mutex;
use sorter_common::event::{Event, EventKind, EventKind::*};
use sorter_common::mode::OperatingMode;
use sorter_common::role::Role;
use sorter_control::{BusActions, ModeMachine, attach, subscriptions};
use sorter_ipc::{EventBus, EventHandler, Origin};
use std::sync::Arc;

// ── Helpers ─────────────────────────────────────────────────────────

/// Publishes commands back onto the bus, like the bridge self-loop.
struct Loopback(Arc<EventBus>);

impl EventHandler for Loopback {
    fn handle_event(&self, event: Event) {
        self.0.publish_local(event);
    }
}

type Machine = ModeMachine<BusActions<Loopback>>;

fn looped(role: Role, bus: &Arc<EventBus>) -> Machine {
    ModeMachine::new(role, BusActions::new(role, Loopback(Arc::clone(bus))))
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn attach_subscribes_every_interest() {
    let bus = Arc::new(EventBus::new(Role::Master));
    let machine = looped(Role::Master, &bus);
    let (_machine, subs) = attach(machine, &bus);

    let kinds = subscriptions();
    assert_eq!(subs.len(), kinds.len());
    for kind in kinds {
        assert_eq!(bus.subscriber_count(kind), 1, "{kind}");
    }
    assert_eq!(bus.subscriber_count(HeartbeatSlave), 0);
}

#[test]
fn bus_events_drive_the_machine() {
    let bus = Arc::new(EventBus::new(Role::Slave));
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in [ModeRunning, ModeEStop, MotorSFast] {
        let seen = Arc::clone(&seen);
        bus.subscribe(kind, move |ev: &Event| seen.lock().push(ev.kind));
    }

    let machine = looped(Role::Slave, &bus);
    let (machine, _) = attach(machine, &bus);

    bus.dispatch_inbound(Event::new(StartMShort), Origin::Peer);
    assert_eq!(machine.lock().kind(), OperatingMode::Running);

    bus.dispatch_inbound(Event::new(LbStartMBlocked), Origin::Peer);
    assert_eq!(machine.lock().workpieces().len(), 1);

    bus.dispatch_inbound(Event::new(EStopMPressed), Origin::Peer);
    assert_eq!(machine.lock().kind(), OperatingMode::EStop);

    assert_eq!(*seen.lock(), vec![ModeRunning, MotorSFast, ModeEStop]);
}

#[test]
fn unsubscribed_kind_never_reaches_machine() {
    let bus = Arc::new(EventBus::new(Role::Master));
    let machine = looped(Role::Master, &bus);
    let (machine, subs) = attach(machine, &bus);

    let (kind, id) = subs
        .iter()
        .copied()
        .find(|(kind, _)| *kind == EventKind::StartMShort)
        .unwrap();
    assert!(bus.unsubscribe(kind, id));

    bus.dispatch_inbound(Event::new(StartMShort), Origin::Local);
    assert_eq!(machine.lock().kind(), OperatingMode::Standby);
    bus.dispatch_inbound(Event::new(StartSShort), Origin::Local);
    assert_eq!(machine.lock().kind(), OperatingMode::Running);
}
