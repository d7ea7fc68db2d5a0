//! Integration test: Running-mode barrier handling and workpiece tracking.

use sorter_common::event::{Event, EventKind::*};
use sorter_common::mode::OperatingMode;
use sorter_common::role::Role;
use sorter_control::{Mode, Outcome};

use super::{drain, feed, machine};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn master_start_barrier_registers_workpiece_on_both_nodes() {
    for (role, fast) in [(Role::Master, MotorMFast), (Role::Slave, MotorSFast)] {
        let mut m = machine(role);
        feed(&mut m, &[StartMShort]);
        drain(&m);

        feed(&mut m, &[LbStartMBlocked, LbStartMUnblocked, LbStartMBlocked]);
        assert_eq!(
            m.workpieces().iter().map(|wp| wp.id).collect::<Vec<_>>(),
            vec![1, 2],
            "{role}"
        );
        assert_eq!(
            drain(&m),
            vec![Event::with_data(fast, 1), Event::with_data(fast, 1)],
            "{role}"
        );
    }
}

#[test]
fn slave_barriers_are_handled_without_commands() {
    for role in [Role::Master, Role::Slave] {
        let mut m = machine(role);
        feed(&mut m, &[StartMShort]);
        drain(&m);

        for kind in [
            LbStartSBlocked,
            LbSwitchSBlocked,
            LbEndSBlocked,
            LbEndSUnblocked,
            LbSwitchMBlocked,
        ] {
            assert_eq!(m.handle(Event::new(kind)), Outcome::Handled);
        }
        assert!(m.workpieces().is_empty(), "{role}");
        assert!(drain(&m).is_empty(), "{role}");
        assert_eq!(m.kind(), OperatingMode::Running);
    }
}

#[test]
fn master_end_barrier_holds_the_belt() {
    for (role, stop) in [(Role::Master, MotorMStop), (Role::Slave, MotorSStop)] {
        let mut m = machine(role);
        feed(&mut m, &[StartSShort]);
        drain(&m);

        feed(&mut m, &[LbEndMBlocked, LbEndMUnblocked]);
        assert_eq!(
            drain(&m),
            vec![Event::with_data(stop, 1), Event::with_data(stop, 0)],
            "{role}"
        );
    }
}

#[test]
fn ramp_barrier_tracks_fill_and_master_ramp_slows_belt() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort]);
    drain(&m);

    feed(&mut m, &[LbRampMBlocked]);
    assert_eq!(drain(&m), vec![Event::with_data(MotorMSlow, 1)]);

    feed(&mut m, &[LbRampSBlocked]);
    assert!(drain(&m).is_empty());
    assert_eq!(
        *m.mode(),
        Mode::Running {
            ramp_blocked: [true, true]
        }
    );

    feed(&mut m, &[LbRampMUnblocked]);
    assert!(drain(&m).is_empty());
    assert_eq!(
        *m.mode(),
        Mode::Running {
            ramp_blocked: [false, true]
        }
    );
}

#[test]
fn slave_node_slows_only_for_master_ramp() {
    let mut m = machine(Role::Slave);
    feed(&mut m, &[StartSShort]);
    drain(&m);

    feed(&mut m, &[LbRampSBlocked]);
    assert!(drain(&m).is_empty());

    feed(&mut m, &[LbRampMBlocked]);
    assert_eq!(drain(&m), vec![Event::with_data(MotorSSlow, 1)]);
    assert_eq!(
        *m.mode(),
        Mode::Running {
            ramp_blocked: [true, true]
        }
    );
}

#[test]
fn ramp_flags_reset_on_next_run() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMShort, LbRampSBlocked, StopSPressed, StartSShort]);
    assert_eq!(
        *m.mode(),
        Mode::Running {
            ramp_blocked: [false, false]
        }
    );
}
