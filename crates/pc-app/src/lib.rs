//! Application layer for the pit controller.
//!
//! Wires the probe, control and history crates into one poll-driven loop,
//! loads and validates configuration, and provides a smoker simulator so the
//! whole pipeline can run without hardware.

pub mod config;
pub mod error;
pub mod pit;
pub mod sim;

pub use config::{
    AppConfig, CadenceConfig, ConfigError, ConfigResult, FanConfig, LidConfig, PidConfig,
    load_config, save_config, validate_config,
};
pub use error::{AppError, AppResult};
pub use pit::{PitController, TickReport};
pub use sim::{SimEvent, SimEventKind, Simulation, SmokerModel, SmokerParams, StallBand};
