//! pc-core: shared foundation for the pit controller crates.
//!
//! Contains:
//! - units (uom temperature types + Celsius/Fahrenheit conversion)
//! - numeric (percentage bounds + rounding helpers)
//! - ids (fixed probe identities)
//! - sampled (self-gating cadence clock)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod sampled;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PcError, PcResult};
pub use ids::*;
pub use numeric::*;
pub use sampled::SampleClock;
pub use units::*;
