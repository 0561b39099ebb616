//! Controller configuration file.
//!
//! A single document in YAML or JSON, chosen by file extension. Every field
//! has a default, so a file only needs to name what it changes.

use std::path::Path;

use pc_controls::{
    DEFAULT_FAN_ON_THRESHOLD, FanMode, LidThresholds, PID_SAMPLE_MS, PidTunings,
};
use pc_core::{NUM_PROBES, ProbeId, TempUnit};
use pc_history::GRAPH_SAMPLE_MS;
use pc_probes::{DEFAULT_EMA_ALPHA, ProbeCalibration, SAMPLE_INTERVAL_MS};
use serde::{Deserialize, Serialize};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported config format: {extension} (expected yaml, yml or json)")]
    UnsupportedFormat { extension: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Unit the operator works in; setpoint, lid detection and telemetry use it.
    pub units: TempUnit,
    /// Pit setpoint in `units`.
    pub setpoint: f64,
    /// Calibration per probe, in pit / meat1 / meat2 order.
    pub probes: Vec<ProbeCalibration>,
    pub pid: PidConfig,
    /// Exponential smoothing factor in `(0, 1]`.
    pub ema_alpha: f64,
    pub fan: FanConfig,
    pub lid: LidConfig,
    pub cadence: CadenceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            units: TempUnit::Fahrenheit,
            setpoint: 225.0,
            probes: vec![ProbeCalibration::default(); NUM_PROBES],
            pid: PidConfig::default(),
            ema_alpha: DEFAULT_EMA_ALPHA,
            fan: FanConfig::default(),
            lid: LidConfig::default(),
            cadence: CadenceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub sample_ms: u64,
}

impl Default for PidConfig {
    fn default() -> Self {
        let PidTunings { kp, ki, kd } = PidTunings::default();
        Self {
            kp,
            ki,
            kd,
            sample_ms: PID_SAMPLE_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FanConfig {
    pub mode: FanMode,
    /// PID output (%) above which the fan starts.
    pub on_threshold: f64,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            mode: FanMode::default(),
            on_threshold: DEFAULT_FAN_ON_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LidConfig {
    /// Drop below setpoint (%) that signals an open lid.
    pub drop_percent: f64,
    /// Distance below setpoint (%) at which the lid counts as closed again.
    pub recover_percent: f64,
    /// Opt-in: ignore drops until the pit first reaches the recover line.
    pub warm_up_arming: bool,
    /// Opt-in: resume control after this long even if the pit has not
    /// recovered. 0 waits indefinitely.
    pub timeout_s: f64,
}

impl Default for LidConfig {
    fn default() -> Self {
        Self {
            drop_percent: 6.0,
            recover_percent: 2.0,
            warm_up_arming: false,
            timeout_s: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CadenceConfig {
    pub temp_sample_ms: u64,
    pub graph_sample_ms: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            temp_sample_ms: SAMPLE_INTERVAL_MS,
            graph_sample_ms: GRAPH_SAMPLE_MS,
        }
    }
}

impl AppConfig {
    pub fn tunings(&self) -> PidTunings {
        PidTunings {
            kp: self.pid.kp,
            ki: self.pid.ki,
            kd: self.pid.kd,
        }
    }

    pub fn lid_thresholds(&self) -> ConfigResult<LidThresholds> {
        LidThresholds::from_percent(self.lid.drop_percent, self.lid.recover_percent).map_err(|err| {
            ConfigError::invalid(
                "lid",
                format!("{}/{}", self.lid.drop_percent, self.lid.recover_percent),
                err.to_string(),
            )
        })
    }

    /// Lid-open timeout in milliseconds, `None` when disabled.
    pub fn lid_timeout_ms(&self) -> Option<u64> {
        (self.lid.timeout_s > 0.0).then(|| (self.lid.timeout_s * 1000.0).round() as u64)
    }

    /// Calibration for one probe, default when the list is short.
    pub fn calibration(&self, probe: ProbeId) -> ProbeCalibration {
        self.probes.get(probe.index()).copied().unwrap_or_default()
    }
}

pub fn validate_config(config: &AppConfig) -> ConfigResult<()> {
    if !config.setpoint.is_finite() || config.setpoint <= 0.0 {
        return Err(ConfigError::invalid(
            "setpoint",
            config.setpoint,
            "must be a positive temperature",
        ));
    }

    if config.probes.len() != NUM_PROBES {
        return Err(ConfigError::invalid(
            "probes",
            config.probes.len(),
            format!("expected {NUM_PROBES} probe calibrations"),
        ));
    }
    for (probe, calibration) in ProbeId::ALL.iter().zip(&config.probes) {
        calibration
            .validate()
            .map_err(|err| {
                ConfigError::invalid(format!("probes.{probe}"), format!("{calibration:?}"), err.to_string())
            })?;
    }

    config
        .tunings()
        .validate()
        .map_err(|err| ConfigError::invalid("pid", format!("{:?}", config.tunings()), err.to_string()))?;
    if config.pid.sample_ms == 0 {
        return Err(ConfigError::invalid("pid.sample_ms", 0, "must be positive"));
    }

    if !(config.ema_alpha > 0.0 && config.ema_alpha <= 1.0) {
        return Err(ConfigError::invalid("ema_alpha", config.ema_alpha, "must be in (0, 1]"));
    }

    if !(0.0..=100.0).contains(&config.fan.on_threshold) {
        return Err(ConfigError::invalid(
            "fan.on_threshold",
            config.fan.on_threshold,
            "must be in [0, 100]",
        ));
    }

    config.lid_thresholds()?;
    if !(config.lid.timeout_s.is_finite() && config.lid.timeout_s >= 0.0) {
        return Err(ConfigError::invalid("lid.timeout_s", config.lid.timeout_s, "must be >= 0"));
    }

    if config.cadence.temp_sample_ms == 0 {
        return Err(ConfigError::invalid("cadence.temp_sample_ms", 0, "must be positive"));
    }
    if config.cadence.graph_sample_ms == 0 {
        return Err(ConfigError::invalid("cadence.graph_sample_ms", 0, "must be positive"));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "yaml" | "yml" => Ok(Format::Yaml),
        "json" => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat { extension }),
    }
}

pub fn load_config(path: &Path) -> ConfigResult<AppConfig> {
    let format = format_of(path)?;
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = match format {
        Format::Yaml => serde_yaml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    };
    validate_config(&config)?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

pub fn save_config(path: &Path, config: &AppConfig) -> ConfigResult<()> {
    validate_config(config)?;
    let content = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(config)?,
        Format::Json => serde_json::to_string_pretty(config)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
