//! Integration test: error recovery from Running.

use sorter_common::event::{Event, EventKind::*};
use sorter_common::mode::OperatingMode;
use sorter_common::role::Role;
use sorter_control::Mode;
use sorter_control::state::error::ErrorKind;

use super::{drain, feed, machine};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn non_self_solvable_needs_reset_then_start() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::Running);
    drain(&m);

    feed(&mut m, &[ErrorNonSelfSolvable]);
    assert_eq!(m.kind(), OperatingMode::Error);
    assert_eq!(
        drain(&m),
        vec![Event::new(ModeError), Event::with_data(MotorMStop, 1)]
    );

    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::Error);
    feed(&mut m, &[ResetMPressed]);
    assert_eq!(m.kind(), OperatingMode::Error);
    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::Standby);
}

#[test]
fn non_self_solvable_ignores_self_solved() {
    let mut m = machine(Role::Slave);
    feed(&mut m, &[StartSShort, ErrorNonSelfSolvable, ErrorSelfSolved]);
    assert_eq!(m.kind(), OperatingMode::Error);
    feed(&mut m, &[ResetSPressed]);
    assert_eq!(m.kind(), OperatingMode::Error);
    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::Standby);
}

#[test]
fn self_solvable_needs_solution_then_reset() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort, ErrorSelfSolvable]);
    assert!(matches!(
        m.mode(),
        Mode::Error(ctx) if ctx.kind == ErrorKind::SelfSolvable && !ctx.resolved
    ));

    feed(&mut m, &[StartMShort, ResetMPressed]);
    assert_eq!(m.kind(), OperatingMode::Error);

    feed(&mut m, &[ErrorSelfSolved]);
    assert_eq!(m.kind(), OperatingMode::Error);
    feed(&mut m, &[ResetMPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);
}

#[test]
fn solved_self_solvable_does_not_clear_on_start() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort, ErrorSelfSolvable, ErrorSelfSolved, StartSShort]);
    assert_eq!(m.kind(), OperatingMode::Error);
    feed(&mut m, &[ResetSPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);
}
