//! Integration test: Standby transitions and ignored events.

use sorter_common::event::{Event, EventKind::*};
use sorter_common::mode::OperatingMode;
use sorter_common::role::Role;
use sorter_control::{Mode, Outcome};

use super::{drain, feed, machine};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn standby_entry_publishes_mode_and_stops_motor() {
    let m = machine(Role::Master);
    assert_eq!(m.kind(), OperatingMode::Standby);
    assert_eq!(
        drain(&m),
        vec![Event::new(ModeStandby), Event::with_data(MotorMStop, 1)]
    );
}

#[test]
fn short_start_from_either_side_runs() {
    for start in [StartMShort, StartSShort] {
        let mut m = machine(Role::Master);
        drain(&m);
        assert_eq!(m.handle(Event::new(start)), Outcome::Handled);
        assert_eq!(m.kind(), OperatingMode::Running);
        assert_eq!(
            drain(&m),
            vec![
                Event::new(ModeRunning),
                Event::with_data(MotorMStop, 0),
                Event::with_data(MotorMSlow, 1),
            ]
        );
    }
}

#[test]
fn long_start_enters_service_mode_and_stop_leaves_it() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMLong]);
    assert_eq!(m.kind(), OperatingMode::ServiceMode);
    feed(&mut m, &[StopMPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);

    let mut m = machine(Role::Slave);
    feed(&mut m, &[StartSLong]);
    assert_eq!(m.kind(), OperatingMode::ServiceMode);
    drain(&m);
    feed(&mut m, &[StopSPressed]);
    assert_eq!(
        drain(&m),
        vec![Event::new(ModeStandby), Event::with_data(MotorSStop, 1)]
    );
}

#[test]
fn stop_from_either_side_returns_to_standby() {
    for stop in [StopMPressed, StopSPressed] {
        let mut m = machine(Role::Slave);
        feed(&mut m, &[StartMShort]);
        assert_eq!(m.kind(), OperatingMode::Running);
        feed(&mut m, &[stop]);
        assert_eq!(m.kind(), OperatingMode::Standby);
    }
}

#[test]
fn events_outside_interest_change_nothing() {
    let mut m = machine(Role::Master);
    drain(&m);
    for kind in [
        StopMPressed,
        ResetMPressed,
        LbStartMBlocked,
        EStopMReleased,
        ErrorSelfSolvable,
        HeartbeatSlave,
        ConnectionLost,
        MotorMFast,
        ModeRunning,
    ] {
        assert_eq!(m.handle(Event::new(kind)), Outcome::Ignored, "{kind}");
    }
    assert_eq!(*m.mode(), Mode::Standby);
    assert!(drain(&m).is_empty());

    feed(&mut m, &[StartMShort]);
    drain(&m);
    for kind in [StartMShort, StartSLong, ResetSPressed, ErrorSelfSolved] {
        assert_eq!(m.handle(Event::new(kind)), Outcome::Ignored, "{kind}");
    }
    assert_eq!(m.kind(), OperatingMode::Running);
    assert!(drain(&m).is_empty());
}
