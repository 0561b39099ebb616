use pc_controls::{
    ActuatorSink, DEFAULT_FAN_ON_THRESHOLD, FanMode, PidController, PidTunings, RecordingActuators,
    split_range,
};
use proptest::prelude::*;

const SP: f64 = 225.0;

#[test]
fn reset_gives_bumpless_restart() {
    let mut pid = PidController::default();
    for t in [212.0, 215.0, 219.0, 223.0] {
        pid.compute(t, SP);
    }
    assert!(pid.integral() > 0.0);

    pid.reset_integrator();
    assert_eq!(pid.integral(), 0.0);

    // no derivative kick and no accumulated history: kp*e + ki*dt*e
    let out = pid.compute(220.0, SP);
    let PidTunings { kp, ki, .. } = pid.tunings();
    assert!((out - (kp * 5.0 + ki * 4.0 * 5.0)).abs() < 1e-9, "out {out}");
}

#[test]
fn lid_open_suspends_output_and_freezes_integral() {
    let mut pid = PidController::default();
    for _ in 0..5 {
        pid.compute(222.0, SP);
    }
    let integral = pid.integral();
    assert!(integral > 0.0);

    // 225 * 0.94 = 211.5
    assert_eq!(pid.compute(200.0, SP), 0.0);
    assert!(pid.is_lid_open());
    assert_eq!(pid.output(), 0.0);
    assert_eq!(pid.integral(), integral);

    // recovering, still below 225 * 0.98 = 220.5
    assert_eq!(pid.compute(215.0, SP), 0.0);
    assert!(pid.is_lid_open());
    assert_eq!(pid.integral(), integral);

    // lid closes; derivative restarts so only P and I act
    let out = pid.compute(221.0, SP);
    assert!(!pid.is_lid_open());
    let expected = 4.0 * 4.0 + integral + 0.02 * 4.0 * 4.0;
    assert!((out - expected).abs() < 1e-9, "out {out} expected {expected}");
}

#[test]
fn tick_chain_feeds_sink() {
    let mut pid = PidController::new(PidTunings::new(10.0, 0.0, 0.0).unwrap());
    let mut sink = RecordingActuators::new();

    for temp in [222.0, 218.0, 215.0] {
        let demand = pid.compute(temp, SP);
        sink.apply(split_range(demand, FanMode::FanAndDamper, DEFAULT_FAN_ON_THRESHOLD));
    }

    let outs = sink.history();
    assert_eq!(outs.len(), 3);
    assert_eq!(outs[0].damper_percent, 30.0);
    assert_eq!(outs[0].fan_percent, 0.0);
    assert_eq!(outs[1].damper_percent, 70.0);
    assert!(outs[1].fan_percent > 0.0);
    assert_eq!(outs[2].damper_percent, 100.0);
    assert_eq!(outs[2].fan_percent, 100.0);
}

fn any_mode() -> impl Strategy<Value = FanMode> {
    prop_oneof![
        Just(FanMode::FanOnly),
        Just(FanMode::DamperPrimary),
        Just(FanMode::FanAndDamper),
    ]
}

proptest! {
    #[test]
    fn split_range_is_monotone(
        a in 0.0f64..=100.0,
        b in 0.0f64..=100.0,
        threshold in 0.0f64..=100.0,
        mode in any_mode(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo_out = split_range(lo, mode, threshold);
        let hi_out = split_range(hi, mode, threshold);
        prop_assert!(lo_out.fan_percent <= hi_out.fan_percent);
        prop_assert!(lo_out.damper_percent <= hi_out.damper_percent);
    }

    #[test]
    fn split_range_stays_in_range(
        pid in -500.0f64..500.0,
        threshold in -50.0f64..150.0,
        mode in any_mode(),
    ) {
        let out = split_range(pid, mode, threshold);
        prop_assert!((0.0..=100.0).contains(&out.fan_percent));
        prop_assert!((0.0..=100.0).contains(&out.damper_percent));
        prop_assert_eq!(out, split_range(pid, mode, threshold));
    }

    #[test]
    fn full_demand_is_full_airflow(threshold in 0.0f64..=100.0, mode in any_mode()) {
        let out = split_range(100.0, mode, threshold);
        prop_assert_eq!(out.fan_percent, 100.0);
        prop_assert_eq!(out.damper_percent, 100.0);
        prop_assert_eq!(split_range(0.0, mode, threshold).fan_percent, 0.0);
    }

    #[test]
    fn pid_output_always_bounded(temps in prop::collection::vec(0.0f64..600.0, 1..50)) {
        let mut pid = PidController::default();
        for t in temps {
            let out = pid.compute(t, SP);
            prop_assert!((0.0..=100.0).contains(&out));
            prop_assert!((0.0..=100.0).contains(&pid.integral()));
        }
    }
}
