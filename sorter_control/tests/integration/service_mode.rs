//! Integration test: calibration and self-test sequence.

use sorter_common::event::{Event, EventKind, EventKind::*};
use sorter_common::mode::OperatingMode;
use sorter_common::role::{Role, Side};
use sorter_control::Mode;
use sorter_control::state::service::ServiceStep;

use super::{Machine, drain, feed, machine};

// ── Helpers ─────────────────────────────────────────────────────────

const ALL_BARRIERS_BLOCKED: [EventKind; 8] = [
    LbStartMBlocked,
    LbSwitchMBlocked,
    LbEndMBlocked,
    LbStartSBlocked,
    LbSwitchSBlocked,
    LbEndSBlocked,
    LbRampMBlocked,
    LbRampSBlocked,
];

fn step(m: &Machine) -> ServiceStep {
    match m.mode() {
        Mode::ServiceMode(step) => *step,
        other => panic!("not in service mode: {other:?}"),
    }
}

fn actuators(lamps: i32, gate: i32) -> Vec<Event> {
    let mut events = Vec::new();
    for side in Side::BOTH {
        let (lamp_kinds, sort) = match side {
            Side::Master => (
                [LampMGreen, LampMYellow, LampMRed, LedMStart, LedMReset, LedMQ1, LedMQ2],
                SortM,
            ),
            Side::Slave => (
                [LampSGreen, LampSYellow, LampSRed, LedSStart, LedSReset, LedSQ1, LedSQ2],
                SortS,
            ),
        };
        events.extend(lamp_kinds.map(|k| Event::with_data(k, lamps)));
        events.push(Event::with_data(sort, gate));
    }
    events
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn full_service_sequence() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartSLong]);
    assert_eq!(step(&m), ServiceStep::CalibrateOffset);
    drain(&m);

    // Calibrate offset
    feed(&mut m, &[StartMShort]);
    assert_eq!(drain(&m), vec![Event::new(CalMOffset)]);
    feed(&mut m, &[ResetMPressed]);
    assert_eq!(step(&m), ServiceStep::CalibrateReference);

    // Calibrate reference
    feed(&mut m, &[StartMShort]);
    assert_eq!(drain(&m), vec![Event::new(CalMRef)]);
    feed(&mut m, &[ResetMPressed]);
    assert!(matches!(step(&m), ServiceStep::SelftestSensors(_)));

    // Self-test sensors
    feed(&mut m, &[LbStartMBlocked]);
    assert_eq!(drain(&m), vec![Event::with_data(MotorMSlow, 1)]);
    feed(&mut m, &[LbSwitchMBlocked, LbEndMBlocked]);
    assert_eq!(drain(&m), vec![Event::with_data(MotorMStop, 1)]);
    feed(&mut m, &[LbStartSBlocked]);
    assert_eq!(drain(&m), vec![Event::with_data(MotorSSlow, 1)]);
    feed(&mut m, &[LbSwitchSBlocked, LbEndSBlocked, LbRampMBlocked, LbRampSBlocked]);
    drain(&m);

    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::ServiceMode);
    assert_eq!(step(&m), ServiceStep::SelftestActuators);

    // Self-test actuators: everything on, gates out.
    assert_eq!(drain(&m), actuators(1, 0));

    // Leaving restores the actuators before the Standby entry.
    feed(&mut m, &[StartMShort]);
    assert_eq!(m.kind(), OperatingMode::Standby);
    let mut expected = actuators(0, 1);
    expected.push(Event::new(ModeStandby));
    expected.push(Event::with_data(MotorMStop, 1));
    assert_eq!(drain(&m), expected);
}

#[test]
fn incomplete_sensor_test_does_not_advance() {
    let mut m = machine(Role::Slave);
    feed(&mut m, &[StartSLong, StartSShort, StartSShort]);
    assert!(matches!(step(&m), ServiceStep::SelftestSensors(_)));

    feed(&mut m, &ALL_BARRIERS_BLOCKED[..7]);
    feed(&mut m, &[StartSShort]);
    match step(&m) {
        ServiceStep::SelftestSensors(list) => assert_eq!(list.missing(), 1),
        other => panic!("advanced too early: {other:?}"),
    }

    feed(&mut m, &ALL_BARRIERS_BLOCKED[7..]);
    feed(&mut m, &[StartSShort]);
    assert_eq!(step(&m), ServiceStep::SelftestActuators);
}

#[test]
fn repeated_barrier_counts_once() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMLong, StartMShort, StartMShort]);
    feed(&mut m, &[LbStartMBlocked; 8]);
    feed(&mut m, &[StartMShort]);
    assert!(matches!(step(&m), ServiceStep::SelftestSensors(_)));
}

#[test]
fn barriers_before_sensor_step_are_not_counted() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMLong]);
    feed(&mut m, &ALL_BARRIERS_BLOCKED);
    assert!(drain(&m).iter().all(|ev| ev.kind != MotorMSlow));
    feed(&mut m, &[StartMShort, StartMShort, StartMShort]);
    assert!(matches!(step(&m), ServiceStep::SelftestSensors(_)));
}

#[test]
fn stop_aborts_from_actuator_step_and_restores_outputs() {
    let mut m = machine(Role::Master);
    feed(&mut m, &[StartMLong, StartMShort, StartMShort]);
    feed(&mut m, &ALL_BARRIERS_BLOCKED);
    feed(&mut m, &[StartMShort]);
    assert_eq!(step(&m), ServiceStep::SelftestActuators);
    drain(&m);

    feed(&mut m, &[StopSPressed]);
    assert_eq!(m.kind(), OperatingMode::Standby);
    assert_eq!(drain(&m)[..16], actuators(0, 1)[..]);
}
