use pc_app::{AppConfig, SimEvent, SimEventKind, Simulation, SmokerParams};
use pc_core::{ProbeId, TempUnit};

const HOUR_MS: u64 = 3_600_000;

fn pit_f(sim: &Simulation) -> f64 {
    sim.controller()
        .temps()
        .temperature(ProbeId::Pit, TempUnit::Fahrenheit)
        .unwrap()
}

fn simulation(config: &AppConfig, params: SmokerParams, events: Vec<SimEvent>) -> Simulation {
    Simulation::new(config, params, events, 1000).unwrap()
}

/// Warm-up arming plus a 240 s open timeout.
fn lid_assist_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.lid.warm_up_arming = true;
    config.lid.timeout_s = 240.0;
    config
}

fn hot_start() -> SmokerParams {
    SmokerParams {
        pit_start_f: Some(225.0),
        ..SmokerParams::default()
    }
}

fn assert_suspended(sim: &Simulation) {
    let controller = sim.controller();
    assert!(controller.pid().is_lid_open());
    assert_eq!(controller.pid().output(), 0.0);
    assert_eq!(controller.command().fan_percent, 0.0);
    assert_eq!(controller.command().damper_percent, 0.0);
}

#[test]
fn cold_start_reads_as_open_lid() {
    let mut sim = simulation(&AppConfig::default(), SmokerParams::default(), Vec::new());
    sim.run_until(600_000, |_| {}).unwrap();

    assert_suspended(&sim);
    assert!(pit_f(&sim) < 100.0, "pit {}", pit_f(&sim));
    assert!(sim.controller().snapshot(600).lid);
}

#[test]
fn lid_event_suspends_until_recovery() {
    let events = vec![SimEvent {
        at_s: 0.0,
        kind: SimEventKind::LidOpen { duration_s: 90.0 },
    }];
    let mut sim = simulation(&AppConfig::default(), hot_start(), events);

    sim.run_until(60_000, |_| {}).unwrap();
    assert_suspended(&sim);

    // closing the lid does not end the suspension while the pit stays below
    // 225 * 0.98
    sim.run_until(HOUR_MS / 2, |_| {}).unwrap();
    assert!(!sim.model().is_lid_open());
    assert!(pit_f(&sim) < 220.5);
    assert_suspended(&sim);
}

#[test]
fn lid_assist_cold_start_settles_at_setpoint() {
    let mut sim = simulation(&lid_assist_config(), SmokerParams::default(), Vec::new());
    let mut lid_seen = false;
    sim.run_until(2 * HOUR_MS, |s| lid_seen |= s.controller().pid().is_lid_open())
        .unwrap();

    assert!(!lid_seen);
    let pit = pit_f(&sim);
    assert!((pit - 225.0).abs() < 5.0, "pit {pit}");
    let output = sim.controller().pid().output();
    assert!(output > 0.0 && output < 100.0, "output {output}");
    let len = sim.controller().history().len();
    assert!(len > 120 && len <= 240, "{len}");
}

#[test]
fn lid_assist_lid_event_suspends_then_recovers() {
    let events = vec![SimEvent {
        at_s: 3600.0,
        kind: SimEventKind::LidOpen { duration_s: 90.0 },
    }];
    let mut sim = simulation(&lid_assist_config(), SmokerParams::default(), events);

    sim.run_until(HOUR_MS, |_| {}).unwrap();
    let mut suspended = false;
    sim.run_until(HOUR_MS + 120_000, |s| {
        if s.controller().pid().is_lid_open() {
            suspended = true;
            assert_eq!(s.controller().command().fan_percent, 0.0);
        }
    })
    .unwrap();
    assert!(suspended);
    assert!(sim.model().temperature_f(ProbeId::Pit) < 180.0);

    sim.run_until(2 * HOUR_MS, |_| {}).unwrap();
    assert!(!sim.controller().pid().is_lid_open());
    let pit = pit_f(&sim);
    assert!((pit - 225.0).abs() < 5.0, "pit {pit}");
}

#[test]
fn lid_assist_setpoint_event_moves_the_pit() {
    let events = vec![SimEvent {
        at_s: 3600.0,
        kind: SimEventKind::Setpoint { value: 250.0 },
    }];
    let mut sim = simulation(&lid_assist_config(), SmokerParams::default(), events);
    sim.run_until(2 * HOUR_MS, |_| {}).unwrap();

    assert_eq!(sim.controller().setpoint(), 250.0);
    let pit = pit_f(&sim);
    assert!((pit - 250.0).abs() < 5.0, "pit {pit}");
}

#[test]
fn lid_assist_timeout_after_fire_out_drives_full_demand() {
    let events = vec![SimEvent {
        at_s: 1800.0,
        kind: SimEventKind::FireOut,
    }];
    let mut sim = simulation(&lid_assist_config(), SmokerParams::default(), events);
    sim.run_until(3 * HOUR_MS, |_| {}).unwrap();

    assert!(sim.model().is_fire_out());
    assert!(pit_f(&sim) < 200.0);
    assert!(!sim.controller().pid().is_lid_open());
    assert_eq!(sim.controller().pid().output(), 100.0);
}

#[test]
fn unplugged_meat_is_reported_absent() {
    let events = vec![SimEvent {
        at_s: 60.0,
        kind: SimEventKind::ProbeDisconnect { probe: ProbeId::Meat2 },
    }];
    let mut sim = simulation(&AppConfig::default(), SmokerParams::default(), events);
    sim.run_until(120_000, |_| {}).unwrap();

    let snap = sim.controller().snapshot(120);
    assert!(snap.meat1.is_value());
    assert!(!snap.meat2.is_value());
    assert!(snap.errors.is_empty());
}
