//! Cook history and the client protocol.
//!
//! [`GraphHistory`] keeps a whole cook in a fixed 240-slot buffer by halving
//! the resolution of old data whenever it fills up. [`telemetry`] turns live
//! readings and history slots into the JSON messages the transport layer
//! forwards to clients, and [`command`] parses what clients send back.

pub mod command;
pub mod error;
pub mod graph;
pub mod telemetry;

pub use command::{Command, SessionAction, parse_command};
pub use error::{TelemetryError, TelemetryResult};
pub use graph::{GRAPH_HISTORY_SIZE, GRAPH_SAMPLE_MS, GraphHistory, GraphSlot};
pub use telemetry::{
    DataPayload, HistoryPoint, MAX_ERRORS, ProbeReading, data_message, history_message,
    history_points, session_reset_message,
};
