//! Charcoal smoker simulator.
//!
//! [`SmokerModel`] is the plant: it receives fan and damper commands as an
//! [`ActuatorSink`] and publishes probe temperatures as raw ADC counts into a
//! shared [`SimulatedSource`], so a [`PitController`] runs the exact pipeline
//! it would run on hardware.
//!
//! Physics, all in °F:
//! - fan and damper follow their commands through a first-order lag
//! - airflow is `damper * max(natural_draft, fan)`
//! - the fire limits the reachable pit temperature in proportion to airflow
//!   and its remaining energy, which decays slowly (quickly once out)
//! - an open lid pulls the pit towards `ambient + 20`
//! - meats approach the pit temperature; meat 1 can stall in a band

use pc_controls::{ActuatorSink, ActuatorState, FirstOrderActuator, SplitRangeOutput};
use pc_core::{KELVIN_OFFSET, ProbeId, fahrenheit_to_celsius};
use pc_probes::{Divider, SimulatedSource, SteinhartHart};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::pit::{PitController, TickReport};

/// Fire energy below which the pit drifts back to ambient.
const EMBERS: f64 = 0.1;

/// Meat 1 stall: progress slows to a crawl inside the band and releases
/// gradually over `duration_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StallBand {
    pub low_f: f64,
    pub high_f: f64,
    pub duration_s: f64,
}

impl Default for StallBand {
    fn default() -> Self {
        Self {
            low_f: 150.0,
            high_f: 165.0,
            duration_s: 3.0 * 3600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokerParams {
    pub ambient_f: f64,
    /// Pit temperature at start; `None` starts cold at ambient.
    pub pit_start_f: Option<f64>,
    pub max_fire_f: f64,
    pub pit_tau_s: f64,
    pub lid_tau_s: f64,
    pub meat_tau_s: f64,
    pub natural_draft: f64,
    /// Fire energy lost per second while burning.
    pub fire_decay_per_s: f64,
    pub meat1_start_f: f64,
    pub meat2_start_f: f64,
    pub stall: Option<StallBand>,
    pub fan_tau_s: f64,
    pub fan_rate_pct_s: f64,
    pub damper_tau_s: f64,
    pub damper_rate_pct_s: f64,
}

impl Default for SmokerParams {
    fn default() -> Self {
        Self {
            ambient_f: 70.0,
            pit_start_f: None,
            max_fire_f: 400.0,
            pit_tau_s: 300.0,
            lid_tau_s: 60.0,
            meat_tau_s: 1800.0,
            natural_draft: 0.15,
            fire_decay_per_s: 3e-6,
            meat1_start_f: 40.0,
            meat2_start_f: 40.0,
            stall: Some(StallBand::default()),
            fan_tau_s: 1.0,
            fan_rate_pct_s: 50.0,
            damper_tau_s: 2.0,
            damper_rate_pct_s: 25.0,
        }
    }
}

pub struct SmokerModel {
    params: SmokerParams,
    probes: SimulatedSource,
    thermistor: SteinhartHart,
    divider: Divider,
    pit_f: f64,
    meat_f: [f64; 2],
    meat_connected: [bool; 2],
    fire_energy: f64,
    fire_out: bool,
    lid_remaining_s: f64,
    command: SplitRangeOutput,
    fan: FirstOrderActuator,
    damper: FirstOrderActuator,
    fan_state: ActuatorState,
    damper_state: ActuatorState,
    stall_elapsed_s: f64,
    elapsed_s: f64,
}

impl SmokerModel {
    /// Smoker at `pit_start_f` (ambient when unset) with a fresh fire. Probe
    /// counts are published immediately.
    pub fn new(params: SmokerParams, probes: SimulatedSource) -> AppResult<Self> {
        let positive = [params.pit_tau_s, params.lid_tau_s, params.meat_tau_s];
        if !positive.iter().all(|t| t.is_finite() && *t > 0.0) {
            return Err(AppError::InvalidInput(
                "smoker time constants must be positive".to_string(),
            ));
        }
        if params.pit_start_f.is_some_and(|t| !t.is_finite()) {
            return Err(AppError::InvalidInput("pit start temperature must be finite".to_string()));
        }

        let mut model = Self {
            params,
            probes,
            thermistor: SteinhartHart::default(),
            divider: Divider::default(),
            pit_f: params.pit_start_f.unwrap_or(params.ambient_f),
            meat_f: [params.meat1_start_f, params.meat2_start_f],
            meat_connected: [true, true],
            fire_energy: 1.0,
            fire_out: false,
            lid_remaining_s: 0.0,
            command: SplitRangeOutput::default(),
            fan: FirstOrderActuator::new(params.fan_tau_s, params.fan_rate_pct_s)?,
            damper: FirstOrderActuator::new(params.damper_tau_s, params.damper_rate_pct_s)?,
            fan_state: ActuatorState::default(),
            damper_state: ActuatorState::default(),
            stall_elapsed_s: 0.0,
            elapsed_s: 0.0,
        };
        model.publish();
        Ok(model)
    }

    /// Advance the plant by `dt_s` seconds and publish new probe counts.
    pub fn advance(&mut self, dt_s: f64) {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return;
        }
        self.elapsed_s += dt_s;
        self.lid_remaining_s = (self.lid_remaining_s - dt_s).max(0.0);

        self.fan_state = self.fan.step(&self.fan_state, dt_s, self.command.fan_percent);
        self.damper_state = self.damper.step(&self.damper_state, dt_s, self.command.damper_percent);

        self.fire_energy = if self.fire_out {
            (self.fire_energy - 0.0005 * dt_s).max(0.0)
        } else {
            (self.fire_energy - self.params.fire_decay_per_s * dt_s).max(0.05)
        };

        self.update_pit(dt_s);
        self.update_meats(dt_s);
        self.publish();
    }

    fn update_pit(&mut self, dt_s: f64) {
        let p = self.params;
        if self.is_lid_open() {
            self.pit_f += (p.ambient_f + 20.0 - self.pit_f) * approach(dt_s, p.lid_tau_s);
            return;
        }

        let reachable =
            p.ambient_f + (p.max_fire_f - p.ambient_f) * self.fire_energy * self.airflow().max(0.05);
        self.pit_f += (reachable - self.pit_f) * approach(dt_s, p.pit_tau_s);

        if self.fire_energy < EMBERS {
            self.pit_f += (p.ambient_f - self.pit_f) * approach(dt_s, 600.0);
        }
    }

    fn update_meats(&mut self, dt_s: f64) {
        let p = self.params;

        if self.meat_connected[0] {
            let mut alpha = approach(dt_s, p.meat_tau_s);
            if let Some(stall) = p.stall {
                if self.meat_f[0] >= stall.low_f && self.stall_elapsed_s < stall.duration_s {
                    self.stall_elapsed_s += dt_s;
                    let progress = (self.stall_elapsed_s / stall.duration_s).min(1.0);
                    alpha *= 0.02 + 0.98 * progress.powi(3);
                    if progress < 0.5 && self.meat_f[0] > stall.high_f {
                        self.meat_f[0] = stall.high_f;
                    }
                }
            }
            self.meat_f[0] += (self.pit_f - self.meat_f[0]) * alpha;
        }

        // smaller cut, heats faster
        if self.meat_connected[1] {
            let alpha = approach(dt_s, p.meat_tau_s * 0.75);
            self.meat_f[1] += (self.pit_f - self.meat_f[1]) * alpha;
        }
    }

    /// Write every probe's raw count into the shared source.
    fn publish(&self) {
        self.probes.set(ProbeId::Pit.adc_channel(), self.counts_for(self.pit_f));
        for (i, probe) in [ProbeId::Meat1, ProbeId::Meat2].into_iter().enumerate() {
            let raw = if self.meat_connected[i] {
                self.counts_for(self.meat_f[i])
            } else {
                i16::MAX
            };
            self.probes.set(probe.adc_channel(), raw);
        }
    }

    fn counts_for(&self, temp_f: f64) -> i16 {
        let t_k = fahrenheit_to_celsius(temp_f) + KELVIN_OFFSET;
        self.thermistor
            .resistance_for(t_k)
            .map_or(i16::MAX, |r| self.divider.raw_for(r))
    }

    /// Effective airflow in `[0, 1]`.
    pub fn airflow(&self) -> f64 {
        let damper = self.damper_state.position_pct / 100.0;
        let fan = self.fan_state.position_pct / 100.0;
        damper * fan.max(self.params.natural_draft)
    }

    /// Open the lid for `duration_s` seconds.
    pub fn open_lid(&mut self, duration_s: f64) {
        self.lid_remaining_s = duration_s.max(0.0);
        tracing::info!(duration_s, "sim: lid opened");
    }

    pub fn is_lid_open(&self) -> bool {
        self.lid_remaining_s > 0.0
    }

    pub fn extinguish(&mut self) {
        self.fire_out = true;
        tracing::info!("sim: fire out");
    }

    pub fn is_fire_out(&self) -> bool {
        self.fire_out
    }

    /// Unplug or replug a meat probe. The pit probe is always present.
    pub fn set_meat_connected(&mut self, probe: ProbeId, connected: bool) {
        let index = match probe {
            ProbeId::Pit => return,
            ProbeId::Meat1 => 0,
            ProbeId::Meat2 => 1,
        };
        self.meat_connected[index] = connected;
        self.publish();
    }

    /// True temperature of a probe's environment in °F.
    pub fn temperature_f(&self, probe: ProbeId) -> f64 {
        match probe {
            ProbeId::Pit => self.pit_f,
            ProbeId::Meat1 => self.meat_f[0],
            ProbeId::Meat2 => self.meat_f[1],
        }
    }

    pub fn fan_position(&self) -> f64 {
        self.fan_state.position_pct
    }

    pub fn damper_position(&self) -> f64 {
        self.damper_state.position_pct
    }

    pub fn fire_energy(&self) -> f64 {
        self.fire_energy
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }
}

impl ActuatorSink for SmokerModel {
    fn apply(&mut self, output: SplitRangeOutput) {
        self.command = output;
    }
}

fn approach(dt_s: f64, tau_s: f64) -> f64 {
    1.0 - (-dt_s / tau_s).exp()
}

/// Scripted disturbance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEventKind {
    Setpoint { value: f64 },
    LidOpen { duration_s: f64 },
    FireOut,
    ProbeDisconnect { probe: ProbeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub at_s: f64,
    #[serde(flatten)]
    pub kind: SimEventKind,
}

/// A controller closed around a [`SmokerModel`].
pub struct Simulation {
    controller: PitController<SimulatedSource, SmokerModel>,
    tick_ms: u64,
    now_ms: u64,
    events: Vec<SimEvent>,
    next_event: usize,
}

impl Simulation {
    pub fn new(
        config: &AppConfig,
        params: SmokerParams,
        mut events: Vec<SimEvent>,
        tick_ms: u64,
    ) -> AppResult<Self> {
        if tick_ms == 0 {
            return Err(AppError::InvalidInput("tick must be positive".to_string()));
        }
        let source = SimulatedSource::new();
        let model = SmokerModel::new(params, source.clone())?;
        let controller = PitController::new(source, model, config)?;
        events.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
        Ok(Self {
            controller,
            tick_ms,
            now_ms: 0,
            events,
            next_event: 0,
        })
    }

    /// Advance by one tick: disturbances, plant, then the controller.
    pub fn step(&mut self) -> AppResult<TickReport> {
        self.apply_due_events()?;
        self.now_ms += self.tick_ms;
        self.controller.actuators_mut().advance(self.tick_ms as f64 / 1000.0);
        Ok(self.controller.tick(self.now_ms))
    }

    /// Step until `end_ms`, calling `observe` after every recorded graph
    /// point.
    pub fn run_until(&mut self, end_ms: u64, mut observe: impl FnMut(&Self)) -> AppResult<()> {
        while self.now_ms < end_ms {
            if self.step()?.recorded {
                observe(self);
            }
        }
        Ok(())
    }

    fn apply_due_events(&mut self) -> AppResult<()> {
        let now_s = self.now_ms as f64 / 1000.0;
        while let Some(event) = self.events.get(self.next_event).copied() {
            if event.at_s > now_s {
                break;
            }
            self.next_event += 1;
            match event.kind {
                SimEventKind::Setpoint { value } => self.controller.set_setpoint(value)?,
                SimEventKind::LidOpen { duration_s } => {
                    self.controller.actuators_mut().open_lid(duration_s)
                }
                SimEventKind::FireOut => self.controller.actuators_mut().extinguish(),
                SimEventKind::ProbeDisconnect { probe } => {
                    self.controller.actuators_mut().set_meat_connected(probe, false)
                }
            }
        }
        Ok(())
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn controller(&self) -> &PitController<SimulatedSource, SmokerModel> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PitController<SimulatedSource, SmokerModel> {
        &mut self.controller
    }

    pub fn model(&self) -> &SmokerModel {
        self.controller.actuators()
    }
}
