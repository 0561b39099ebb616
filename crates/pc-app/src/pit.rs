//! The cooperative control loop.
//!
//! [`PitController`] owns the four units and is driven by repeated calls to
//! [`PitController::tick`] with a monotonic millisecond clock. Each unit gates
//! its own work:
//! - probes are sampled every `cadence.temp_sample_ms`
//! - the PID runs every `pid.sample_ms`, and only while the pit probe reads
//! - split-range output is recomputed and applied on every tick
//! - a history point is recorded every `cadence.graph_sample_ms`

use pc_controls::{
    ActuatorSink, FanMode, PidController, SplitRangeOutput, split_range,
};
use pc_core::{ProbeId, SampleClock, TempUnit, clamp_percent};
use pc_history::{
    Command, DataPayload, GraphHistory, ProbeReading, SessionAction, session_reset_message,
};
use pc_probes::{AnalogSource, ProbeStatus, TempManager};

use crate::config::{AppConfig, validate_config};
use crate::error::{AppError, AppResult};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sampled: bool,
    pub pid_ran: bool,
    pub recorded: bool,
}

pub struct PitController<S, A> {
    temps: TempManager<S>,
    pid: PidController,
    actuators: A,
    history: GraphHistory,
    unit: TempUnit,
    setpoint: f64,
    /// Setpoint the PID last ran against.
    pid_setpoint: f64,
    reset_pending: bool,
    fan_mode: FanMode,
    fan_on_threshold: f64,
    meat_targets: [Option<f64>; 2],
    est: Option<u32>,
    pid_clock: SampleClock,
    graph_clock: SampleClock,
    command: SplitRangeOutput,
}

impl<S: AnalogSource, A: ActuatorSink> PitController<S, A> {
    pub fn new(source: S, actuators: A, config: &AppConfig) -> AppResult<Self> {
        validate_config(config)?;

        let mut temps = TempManager::with_interval(source, config.cadence.temp_sample_ms);
        temps.set_ema_alpha(config.ema_alpha)?;
        for probe in ProbeId::ALL {
            temps.set_calibration(probe, config.calibration(probe))?;
        }

        let pid = PidController::new(config.tunings())
            .with_sample_period_ms(config.pid.sample_ms)?
            .with_lid_thresholds(config.lid_thresholds()?)
            .with_lid_warm_up_arming(config.lid.warm_up_arming)
            .with_lid_timeout_ms(config.lid_timeout_ms());

        Ok(Self {
            temps,
            pid,
            actuators,
            history: GraphHistory::new(),
            unit: config.units,
            setpoint: config.setpoint,
            pid_setpoint: config.setpoint,
            reset_pending: false,
            fan_mode: config.fan.mode,
            fan_on_threshold: config.fan.on_threshold,
            meat_targets: [None, None],
            est: None,
            pid_clock: SampleClock::new(config.pid.sample_ms),
            graph_clock: SampleClock::new(config.cadence.graph_sample_ms),
            command: SplitRangeOutput::default(),
        })
    }

    /// Run one loop iteration at `now_ms`. Cheap when nothing is due.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport {
            sampled: self.temps.update(now_ms),
            ..TickReport::default()
        };

        if self.pid_clock.poll(now_ms) {
            report.pid_ran = true;
            if self.reset_pending || self.setpoint != self.pid_setpoint {
                self.pid.reset_integrator();
                self.pid_setpoint = self.setpoint;
                self.reset_pending = false;
            }
            // a disconnected pit probe holds the last output
            if let Some(pit) = self.temps.temperature(ProbeId::Pit, self.unit) {
                self.pid.compute(pit, self.setpoint);
            }
        }

        self.command = split_range(self.pid.output(), self.fan_mode, self.fan_on_threshold);
        self.actuators.apply(self.command);

        if self.graph_clock.poll(now_ms) {
            report.recorded = true;
            self.history.add_readings(&self.temps.readings(self.unit), self.setpoint);
        }

        report
    }

    /// Operator setpoint change. The integrator is reset before the next PID
    /// computation.
    pub fn set_setpoint(&mut self, setpoint: f64) -> AppResult<()> {
        if !setpoint.is_finite() {
            return Err(AppError::InvalidInput(format!("setpoint {setpoint} is not finite")));
        }
        if setpoint != self.setpoint {
            tracing::info!(from = self.setpoint, to = setpoint, unit = %self.unit, "setpoint changed");
            self.setpoint = setpoint;
        }
        Ok(())
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn unit(&self) -> TempUnit {
        self.unit
    }

    pub fn set_fan_mode(&mut self, mode: FanMode) {
        if mode != self.fan_mode {
            tracing::info!(%mode, "fan mode changed");
            self.fan_mode = mode;
        }
    }

    pub fn fan_mode(&self) -> FanMode {
        self.fan_mode
    }

    pub fn set_fan_on_threshold(&mut self, threshold: f64) -> AppResult<()> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(AppError::InvalidInput(format!(
                "fan-on threshold {threshold} is outside [0, 100]"
            )));
        }
        self.fan_on_threshold = threshold;
        Ok(())
    }

    /// Meat alarm targets in the display unit; `None` or `<= 0` clears one.
    pub fn set_meat_targets(&mut self, meat1: Option<f64>, meat2: Option<f64>) {
        let keep = |t: Option<f64>| t.filter(|v| v.is_finite() && *v > 0.0);
        self.meat_targets = [keep(meat1), keep(meat2)];
    }

    pub fn meat_targets(&self) -> [Option<f64>; 2] {
        self.meat_targets
    }

    /// Estimated completion time forwarded in snapshots.
    pub fn set_estimate(&mut self, est: Option<u32>) {
        self.est = est.filter(|&t| t > 0);
    }

    /// Start a new cook: history is dropped and the integrator is reset on
    /// the next PID run.
    pub fn new_session(&mut self) {
        self.history.clear();
        self.graph_clock.reset();
        self.pid.reset_lid_detection();
        self.reset_pending = true;
        tracing::info!(setpoint = self.setpoint, "new session");
    }

    /// Apply a client command. Returns the message to broadcast to every
    /// client, if the command calls for one.
    pub fn apply_command(&mut self, command: &Command) -> AppResult<Option<String>> {
        match *command {
            Command::SetSetpoint { sp } => self.set_setpoint(sp)?,
            Command::Alarm {
                meat1_target,
                meat2_target,
            } => {
                let [meat1, meat2] = self.meat_targets;
                self.set_meat_targets(
                    meat1_target.unwrap_or(meat1),
                    meat2_target.unwrap_or(meat2),
                );
            }
            Command::SetFanMode { fan_mode } => self.set_fan_mode(fan_mode),
            Command::Session {
                action: SessionAction::New,
            } => {
                self.new_session();
                return Ok(Some(session_reset_message(self.setpoint)?));
            }
            Command::Unknown => tracing::debug!("ignoring unknown client command"),
        }
        Ok(None)
    }

    /// Latest fan/damper command.
    pub fn command(&self) -> SplitRangeOutput {
        self.command
    }

    /// Live data for the transport layer.
    pub fn snapshot(&self, ts: u32) -> DataPayload {
        let mut payload = DataPayload {
            ts,
            fan: clamp_percent(self.command.fan_percent),
            damper: clamp_percent(self.command.damper_percent),
            sp: self.setpoint,
            lid: self.pid.is_lid_open(),
            fan_mode: self.fan_mode,
            meat1_target: self.meat_targets[0],
            meat2_target: self.meat_targets[1],
            est: self.est,
            ..DataPayload::default()
        };
        payload.set_readings(ProbeId::ALL.map(|probe| self.reading(probe)));
        for message in self.fault_messages() {
            payload.push_error(message);
        }
        payload
    }

    fn reading(&self, probe: ProbeId) -> ProbeReading {
        match self.temps.status(probe) {
            ProbeStatus::ShortCircuit => ProbeReading::Shorted,
            _ => self.temps.temperature(probe, self.unit).into(),
        }
    }

    /// Probe faults worth surfacing. An unplugged meat probe is normal.
    pub fn fault_messages(&self) -> Vec<String> {
        ProbeId::ALL
            .into_iter()
            .filter_map(|probe| match self.temps.status(probe) {
                ProbeStatus::Ok => None,
                ProbeStatus::ShortCircuit => Some(format!("{} probe shorted", display_name(probe))),
                ProbeStatus::OpenCircuit if probe == ProbeId::Pit => {
                    Some(format!("{} probe disconnected", display_name(probe)))
                }
                ProbeStatus::OpenCircuit => None,
            })
            .collect()
    }

    pub fn temps(&self) -> &TempManager<S> {
        &self.temps
    }

    pub fn temps_mut(&mut self) -> &mut TempManager<S> {
        &mut self.temps
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn pid_mut(&mut self) -> &mut PidController {
        &mut self.pid
    }

    pub fn history(&self) -> &GraphHistory {
        &self.history
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn actuators_mut(&mut self) -> &mut A {
        &mut self.actuators
    }
}

fn display_name(probe: ProbeId) -> &'static str {
    match probe {
        ProbeId::Pit => "Pit",
        ProbeId::Meat1 => "Meat 1",
        ProbeId::Meat2 => "Meat 2",
    }
}
