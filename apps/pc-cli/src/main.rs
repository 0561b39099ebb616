use clap::{Parser, Subcommand};
use pc_app::{
    AppConfig, AppError, AppResult, ConfigError, SimEvent, Simulation, SmokerParams, load_config,
    save_config,
};
use pc_controls::{DEFAULT_FAN_ON_THRESHOLD, FanMode, split_range};
use pc_core::{KELVIN_OFFSET, ProbeId, TempUnit};
use pc_history::{data_message, history_message, history_points};
use pc_probes::{Divider, SteinhartHart};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pc-cli")]
#[command(about = "Pit Claw CLI - smoker controller simulation and tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated cook through the full control pipeline
    Simulate {
        /// Controller configuration (YAML or JSON); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Smoker model parameters (YAML)
        #[arg(long)]
        plant: Option<PathBuf>,
        /// Scripted events (YAML list)
        #[arg(long)]
        events: Option<PathBuf>,
        /// Simulated duration in hours
        #[arg(long, default_value_t = 6.0)]
        hours: f64,
        /// Loop tick in milliseconds
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,
        /// Print a status line every this many simulated seconds
        #[arg(long, default_value_t = 300)]
        every_s: u64,
        /// Emit data messages as JSON lines instead of a table
        #[arg(long)]
        json: bool,
        /// Write the final history message to this file
        #[arg(long)]
        history_out: Option<PathBuf>,
    },
    /// Validate a configuration file
    ValidateConfig {
        /// Path to the configuration file
        config_path: PathBuf,
    },
    /// Write a configuration file with default values
    InitConfig {
        /// Output path; the extension selects YAML or JSON
        config_path: PathBuf,
    },
    /// Convert between raw ADC counts and temperatures
    #[command(subcommand)]
    Convert(ConvertCommands),
    /// Show how a PID output is split between fan and damper
    Split {
        /// PID output in percent
        pid: f64,
        #[arg(long, default_value_t = FanMode::default())]
        mode: FanMode,
        #[arg(long, default_value_t = DEFAULT_FAN_ON_THRESHOLD)]
        threshold: f64,
    },
}

#[derive(Subcommand)]
enum ConvertCommands {
    /// Raw count to temperature
    Raw {
        raw: i16,
        #[arg(long, default_value_t = TempUnit::Fahrenheit)]
        unit: TempUnit,
    },
    /// Temperature to raw count
    Temp {
        temp: f64,
        #[arg(long, default_value_t = TempUnit::Fahrenheit)]
        unit: TempUnit,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            plant,
            events,
            hours,
            tick_ms,
            every_s,
            json,
            history_out,
        } => {
            let options = SimulateOptions {
                hours,
                tick_ms,
                every_s,
                json,
            };
            cmd_simulate(
                config.as_deref(),
                plant.as_deref(),
                events.as_deref(),
                &options,
                history_out.as_deref(),
            )
        }
        Commands::ValidateConfig { config_path } => cmd_validate_config(&config_path),
        Commands::InitConfig { config_path } => cmd_init_config(&config_path),
        Commands::Convert(convert) => match convert {
            ConvertCommands::Raw { raw, unit } => cmd_convert_raw(raw, unit),
            ConvertCommands::Temp { temp, unit } => cmd_convert_temp(temp, unit),
        },
        Commands::Split {
            pid,
            mode,
            threshold,
        } => cmd_split(pid, mode, threshold),
    }
}

struct SimulateOptions {
    hours: f64,
    tick_ms: u64,
    every_s: u64,
    json: bool,
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content).map_err(ConfigError::from)?)
}

fn cmd_simulate(
    config_path: Option<&Path>,
    plant_path: Option<&Path>,
    events_path: Option<&Path>,
    options: &SimulateOptions,
    history_out: Option<&Path>,
) -> AppResult<()> {
    if !(options.hours.is_finite() && options.hours > 0.0) {
        return Err(AppError::InvalidInput(format!(
            "duration must be positive, got {} h",
            options.hours
        )));
    }

    let config = match config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    let params: SmokerParams = match plant_path {
        Some(path) => read_yaml(path)?,
        None => SmokerParams::default(),
    };
    let events: Vec<SimEvent> = match events_path {
        Some(path) => read_yaml(path)?,
        None => Vec::new(),
    };

    let mut sim = Simulation::new(&config, params, events, options.tick_ms)?;
    let end_ms = (options.hours * 3_600_000.0).round() as u64;
    let every_ms = options.every_s.max(1) * 1000;
    let unit = config.units;

    if !options.json {
        println!(
            "Simulating {:.1} h at setpoint {}{} ({} mode)",
            options.hours,
            config.setpoint,
            unit,
            config.fan.mode.label()
        );
        println!(
            "{:>8}  {:>7}  {:>7}  {:>7}  {:>4}  {:>6}  lid",
            "time", "pit", "meat1", "meat2", "fan", "damper"
        );
    }

    let mut next_report_ms = 0;
    let mut failure = None;
    sim.run_until(end_ms, |s| {
        if s.now_ms() < next_report_ms || failure.is_some() {
            return;
        }
        next_report_ms = s.now_ms() + every_ms;
        let snapshot = s.controller().snapshot(seconds(s.now_ms()));
        if options.json {
            match data_message(&snapshot) {
                Ok(line) => println!("{line}"),
                Err(err) => failure = Some(err),
            }
        } else {
            println!(
                "{:>8}  {:>7}  {:>7}  {:>7}  {:>3.0}%  {:>5.0}%  {}",
                clock(s.now_ms()),
                format_temp(s, ProbeId::Pit, unit),
                format_temp(s, ProbeId::Meat1, unit),
                format_temp(s, ProbeId::Meat2, unit),
                snapshot.fan,
                snapshot.damper,
                if snapshot.lid { "open" } else { "" }
            );
        }
    })?;
    if let Some(err) = failure {
        return Err(err.into());
    }

    let controller = sim.controller();
    if let Some(path) = history_out {
        let points = history_points(controller.history(), 0, seconds(sim.now_ms()));
        let [meat1_target, meat2_target] = controller.meat_targets();
        let message = history_message(&points, controller.setpoint(), meat1_target, meat2_target)?;
        std::fs::write(path, message)?;
        if !options.json {
            println!("✓ Wrote {} history points to {}", points.len(), path.display());
        }
    }

    if !options.json {
        let model = sim.model();
        println!("✓ Simulation completed at {}", clock(sim.now_ms()));
        println!("  Pit:   {:.1}°F", model.temperature_f(ProbeId::Pit));
        println!("  Meat1: {:.1}°F", model.temperature_f(ProbeId::Meat1));
        println!("  Meat2: {:.1}°F", model.temperature_f(ProbeId::Meat2));
        println!("  Fire energy: {:.2}", model.fire_energy());
        println!("  History slots: {}", controller.history().len());
    }
    Ok(())
}

fn seconds(ms: u64) -> u32 {
    u32::try_from(ms / 1000).unwrap_or(u32::MAX)
}

fn clock(ms: u64) -> String {
    let s = ms / 1000;
    format!("{}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

fn format_temp(sim: &Simulation, probe: ProbeId, unit: TempUnit) -> String {
    sim.controller()
        .temps()
        .temperature(probe, unit)
        .map_or_else(|| "--".to_string(), |t| format!("{t:.1}"))
}

fn cmd_validate_config(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = load_config(config_path)?;
    println!("✓ Configuration is valid");
    println!("  Setpoint: {}{}", config.setpoint, config.units);
    println!(
        "  PID: kp={} ki={} kd={} every {} ms",
        config.pid.kp, config.pid.ki, config.pid.kd, config.pid.sample_ms
    );
    println!(
        "  Fan: {} (on above {}%)",
        config.fan.mode.label(),
        config.fan.on_threshold
    );
    println!(
        "  Lid: drop {}% / recover {}%",
        config.lid.drop_percent, config.lid.recover_percent
    );
    if config.lid.warm_up_arming {
        println!("  Lid: warm-up arming on");
    }
    if let Some(ms) = config.lid_timeout_ms() {
        println!("  Lid: resume after {} s open", ms / 1000);
    }
    Ok(())
}

fn cmd_init_config(config_path: &Path) -> AppResult<()> {
    if config_path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            config_path.display()
        )));
    }
    save_config(config_path, &AppConfig::default())?;
    println!("✓ Wrote default configuration to {}", config_path.display());
    Ok(())
}

fn cmd_convert_raw(raw: i16, unit: TempUnit) -> AppResult<()> {
    let resistance = Divider::default().resistance(raw);
    if resistance <= 0.0 || !resistance.is_finite() {
        println!("raw {raw}: no usable resistance (short or full scale)");
        return Ok(());
    }
    match SteinhartHart::default().temperature_k(resistance) {
        Some(t_k) => println!(
            "raw {raw} -> {resistance:.0} Ω -> {:.1}{unit}",
            unit.from_celsius(t_k - KELVIN_OFFSET)
        ),
        None => println!("raw {raw} -> {resistance:.0} Ω -> out of calibration range"),
    }
    Ok(())
}

fn cmd_convert_temp(temp: f64, unit: TempUnit) -> AppResult<()> {
    let t_k = unit.to_celsius(temp) + KELVIN_OFFSET;
    let resistance = SteinhartHart::default().resistance_for(t_k).ok_or_else(|| {
        AppError::InvalidInput(format!("{temp}{unit} is outside the thermistor range"))
    })?;
    let raw = Divider::default().raw_for(resistance);
    println!("{temp}{unit} -> {resistance:.0} Ω -> raw {raw}");
    Ok(())
}

fn cmd_split(pid: f64, mode: FanMode, threshold: f64) -> AppResult<()> {
    let output = split_range(pid, mode, threshold);
    println!(
        "pid {pid}% ({}, fan on above {threshold}%) -> fan {:.1}%, damper {:.1}%",
        mode.label(),
        output.fan_percent,
        output.damper_percent
    );
    Ok(())
}
