//! Control primitives for the pit controller.
//!
//! This crate turns a calibrated pit temperature and an operator setpoint into
//! fan and damper commands.
//!
//! # Architecture
//!
//! - [`PidController`] produces a single heat-demand percentage in `[0, 100]`
//!   and superimposes a lid-open detector ([`LidDetector`]) that suspends the
//!   output while the pit is venting heat. [`LidAssist`] adds opt-in warm-up
//!   arming and an open timeout on top.
//! - [`split_range`] distributes that percentage over the damper (cheap,
//!   quiet natural draft) and the blower fan (forced draft) according to a
//!   [`FanMode`].
//! - [`ActuatorSink`] is the boundary to the drivers; they only ever see
//!   percentages.
//!
//! # Design Principles
//!
//! - **Poll-driven**: nothing blocks or allocates per tick; the caller owns
//!   the cadence
//! - **State, not errors**: lid-open is an operating condition exposed through
//!   accessors; errors are reserved for invalid configuration
//! - **Pure mixing**: split-range is a stateless function so it can be
//!   recomputed from recorded PID values

pub mod actuator;
pub mod controller;
pub mod error;
pub mod lid;
pub mod split_range;

pub use actuator::{
    ActuatorSink, ActuatorState, DEFAULT_RECORD_LIMIT, FirstOrderActuator, RecordingActuators,
};
pub use controller::{PID_SAMPLE_MS, PidController, PidTunings};
pub use error::{ControlError, ControlResult};
pub use lid::{LidAssist, LidDetector, LidState, LidThresholds};
pub use split_range::{DEFAULT_FAN_ON_THRESHOLD, FanMode, SplitRangeOutput, split_range};
