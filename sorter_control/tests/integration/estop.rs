//! Integration test: emergency-stop episodes.

use sorter_common::event::{Event, EventKind::*};
use sorter_common::mode::OperatingMode;
use sorter_common::role::Role;

use super::{drain, feed, machine};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn running_estop_enters_estop_with_motor_stopped() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort]);
    drain(&m);
    feed(&mut m, &[EStopSPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);
    assert_eq!(
        drain(&m),
        vec![Event::new(ModeEStop), Event::with_data(MotorMStop, 1)]
    );
}

#[test]
fn double_press_needs_both_released_and_both_reset() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::Running);
    feed(&mut m, &[EStopMPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);

    // One e-stop pressed.
    for kind in [ResetMPressed, ResetSPressed] {
        feed(&mut m, &[kind]);
        assert_eq!(m.kind(), OperatingMode::EStop);
    }

    // Second e-stop pressed.
    for kind in [EStopSPressed, ResetMPressed, ResetSPressed] {
        feed(&mut m, &[kind]);
        assert_eq!(m.kind(), OperatingMode::EStop);
    }

    // First released; resets still do not count.
    for kind in [EStopMReleased, ResetMPressed, ResetSPressed] {
        feed(&mut m, &[kind]);
        assert_eq!(m.kind(), OperatingMode::EStop);
    }

    // Both released; both resets required.
    feed(&mut m, &[EStopSReleased, ResetMPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);
    drain(&m);
    feed(&mut m, &[ResetSPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);
    assert_eq!(
        drain(&m),
        vec![Event::new(ModeStandby), Event::with_data(MotorMStop, 1)]
    );
}

#[test]
fn single_press_needs_release_and_own_reset() {
    let mut m = machine(Role::Slave);
    feed(&mut m, &[EStopSPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);

    feed(&mut m, &[ResetSPressed, EStopSReleased]);
    assert_eq!(m.kind(), OperatingMode::EStop);
    feed(&mut m, &[ResetMPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);
    feed(&mut m, &[ResetSPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);
}

#[test]
fn untouched_side_needs_no_reset() {
    for (pressed, released, reset) in [
        (EStopMPressed, EStopMReleased, ResetMPressed),
        (EStopSPressed, EStopSReleased, ResetSPressed),
    ] {
        let mut m = machine(Role::Master);
        feed(&mut m, &[pressed, released, reset]);
        // The other side was never pressed, so its reset is never asked for.
        assert_eq!(m.kind(), OperatingMode::Standby, "{pressed}");
    }
}

#[test]
fn estop_preempts_service_and_error() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMLong, StartMShort, EStopMPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);

    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort, ErrorSelfSolvable, EStopSPressed]);
    assert_eq!(m.kind(), OperatingMode::EStop);
    feed(&mut m, &[EStopSReleased, ResetSPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);
}
