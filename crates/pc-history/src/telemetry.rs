//! Outbound telemetry messages.
//!
//! Wire conventions:
//! - temperatures carry one decimal place
//! - an absent probe is `null`, never 0
//! - a shorted probe is `-1`, distinct from absent
//! - fan, damper, setpoints and meat targets are whole numbers, truncated
//!   toward zero; unset targets are `null`

use pc_controls::FanMode;
use pc_core::{NUM_PROBES, clamp_percent, round_tenth};
use serde::{Serialize, Serializer};

use crate::error::TelemetryResult;
use crate::graph::GraphHistory;

/// Maximum number of error strings carried by one data message.
pub const MAX_ERRORS: usize = 8;

/// A probe temperature as the transport layer sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ProbeReading {
    Value(f64),
    #[default]
    Absent,
    Shorted,
}

impl ProbeReading {
    pub fn is_value(&self) -> bool {
        matches!(self, ProbeReading::Value(_))
    }
}

impl From<Option<f64>> for ProbeReading {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ProbeReading::Absent, ProbeReading::Value)
    }
}

impl Serialize for ProbeReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            ProbeReading::Value(v) if v.is_finite() => serializer.serialize_f64(round_tenth(v)),
            ProbeReading::Value(_) | ProbeReading::Absent => serializer.serialize_none(),
            ProbeReading::Shorted => serializer.serialize_i8(-1),
        }
    }
}

/// Periodic live-data broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPayload {
    /// Seconds since the epoch (or since boot without a clock).
    pub ts: u32,
    pub pit: ProbeReading,
    pub meat1: ProbeReading,
    pub meat2: ProbeReading,
    #[serde(serialize_with = "whole_percent")]
    pub fan: f64,
    #[serde(serialize_with = "whole_percent")]
    pub damper: f64,
    #[serde(serialize_with = "whole_degrees")]
    pub sp: f64,
    pub lid: bool,
    pub fan_mode: FanMode,
    #[serde(serialize_with = "optional_target")]
    pub meat1_target: Option<f64>,
    #[serde(serialize_with = "optional_target")]
    pub meat2_target: Option<f64>,
    /// Estimated completion time, same clock as `ts`.
    pub est: Option<u32>,
    #[serde(serialize_with = "capped_errors")]
    pub errors: Vec<String>,
}

impl DataPayload {
    /// Probe readings in [`pc_core::ProbeId`] order.
    pub fn set_readings(&mut self, readings: [ProbeReading; NUM_PROBES]) {
        [self.pit, self.meat1, self.meat2] = readings;
    }

    /// Add an error string. Returns `false` once [`MAX_ERRORS`] are queued.
    pub fn push_error(&mut self, message: impl Into<String>) -> bool {
        if self.errors.len() >= MAX_ERRORS {
            return false;
        }
        self.errors.push(message.into());
        true
    }
}

/// One replayed history point.
///
/// Graph slots do not record actuator state; those fields are omitted when
/// unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub ts: u32,
    pub pit: ProbeReading,
    pub meat1: ProbeReading,
    pub meat2: ProbeReading,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damper: Option<u8>,
    #[serde(serialize_with = "whole_degrees")]
    pub sp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lid: Option<bool>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Message<'a> {
    Data(&'a DataPayload),
    #[serde(rename_all = "camelCase")]
    History {
        #[serde(serialize_with = "whole_degrees")]
        sp: f64,
        #[serde(serialize_with = "optional_target")]
        meat1_target: Option<f64>,
        #[serde(serialize_with = "optional_target")]
        meat2_target: Option<f64>,
        data: &'a [HistoryPoint],
    },
    Session {
        action: &'static str,
        #[serde(serialize_with = "whole_degrees")]
        sp: f64,
    },
}

/// `{"type":"data", ...}`
pub fn data_message(payload: &DataPayload) -> TelemetryResult<String> {
    Ok(serde_json::to_string(&Message::Data(payload))?)
}

/// `{"type":"history","sp":..,"meat1Target":..,"meat2Target":..,"data":[..]}`
pub fn history_message(
    points: &[HistoryPoint],
    sp: f64,
    meat1_target: Option<f64>,
    meat2_target: Option<f64>,
) -> TelemetryResult<String> {
    Ok(serde_json::to_string(&Message::History {
        sp,
        meat1_target,
        meat2_target,
        data: points,
    })?)
}

/// `{"type":"session","action":"reset","sp":..}`
pub fn session_reset_message(sp: f64) -> TelemetryResult<String> {
    Ok(serde_json::to_string(&Message::Session {
        action: "reset",
        sp,
    })?)
}

/// Convert graph slots to replay points.
///
/// Slots carry no timestamps and older ones span more time after
/// condensation, so timestamps are spread evenly from `start_ts` (oldest) to
/// `end_ts` (newest).
pub fn history_points(history: &GraphHistory, start_ts: u32, end_ts: u32) -> Vec<HistoryPoint> {
    let n = history.len();
    let span = u64::from(end_ts.saturating_sub(start_ts));
    history
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let ts = if n <= 1 {
                end_ts
            } else {
                let offset = span * i as u64 / (n as u64 - 1);
                start_ts.saturating_add(offset as u32)
            };
            let [pit, meat1, meat2] = slot.values().map(ProbeReading::from);
            HistoryPoint {
                ts,
                pit,
                meat1,
                meat2,
                fan: None,
                damper: None,
                sp: slot.setpoint,
                lid: None,
            }
        })
        .collect()
}

fn whole_percent<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(clamp_percent(*v) as u8)
}

fn whole_degrees<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        serializer.serialize_i64(*v as i64)
    } else {
        serializer.serialize_none()
    }
}

fn optional_target<S: Serializer>(v: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match *v {
        Some(t) if t.is_finite() && t > 0.0 => serializer.serialize_i64(t as i64),
        _ => serializer.serialize_none(),
    }
}

fn capped_errors<S: Serializer>(errors: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().take(MAX_ERRORS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn probe_reading_encodings() {
        assert_eq!(serde_json::to_string(&ProbeReading::Value(225.04)).unwrap(), "225.0");
        assert_eq!(serde_json::to_string(&ProbeReading::Value(99.96)).unwrap(), "100.0");
        assert_eq!(serde_json::to_string(&ProbeReading::Absent).unwrap(), "null");
        assert_eq!(serde_json::to_string(&ProbeReading::Shorted).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&ProbeReading::Value(f64::NAN)).unwrap(), "null");
        assert_eq!(ProbeReading::from(None), ProbeReading::Absent);
    }

    #[test]
    fn data_message_shape() {
        let mut payload = DataPayload {
            ts: 1_700_000_000,
            fan: 42.4,
            damper: 100.0,
            sp: 225.0,
            lid: true,
            meat1_target: Some(203.0),
            meat2_target: Some(0.0),
            ..DataPayload::default()
        };
        payload.set_readings([
            ProbeReading::Value(224.96),
            ProbeReading::Shorted,
            ProbeReading::Absent,
        ]);
        payload.push_error("Meat 1 probe shorted");

        let v = parse(&data_message(&payload).unwrap());
        assert_eq!(v["type"], "data");
        assert_eq!(v["ts"], 1_700_000_000u32);
        assert_eq!(v["pit"], json!(225.0));
        assert_eq!(v["meat1"], json!(-1));
        assert!(v["meat2"].is_null());
        assert_eq!(v["fan"], 42);
        assert_eq!(v["damper"], 100);
        assert_eq!(v["sp"], 225);
        assert_eq!(v["lid"], true);
        assert_eq!(v["fanMode"], "fan_and_damper");
        assert_eq!(v["meat1Target"], 203);
        assert!(v["meat2Target"].is_null());
        assert!(v["est"].is_null());
        assert_eq!(v["errors"], json!(["Meat 1 probe shorted"]));
    }

    #[test]
    fn whole_number_fields_truncate() {
        let payload = DataPayload {
            fan: 42.9,
            damper: 99.99,
            sp: 237.9,
            meat1_target: Some(203.7),
            meat2_target: Some(0.4),
            ..DataPayload::default()
        };
        let v = parse(&data_message(&payload).unwrap());
        assert_eq!(v["fan"], 42);
        assert_eq!(v["damper"], 99);
        assert_eq!(v["sp"], 237);
        assert_eq!(v["meat1Target"], 203);
        assert_eq!(v["meat2Target"], 0);

        let v = parse(&session_reset_message(249.6).unwrap());
        assert_eq!(v["sp"], 249);
        let v = parse(&history_message(&[], 225.5, Some(164.9), None).unwrap());
        assert_eq!(v["sp"], 225);
        assert_eq!(v["meat1Target"], 164);
    }

    #[test]
    fn errors_are_capped() {
        let mut payload = DataPayload::default();
        for i in 0..MAX_ERRORS {
            assert!(payload.push_error(format!("e{i}")));
        }
        assert!(!payload.push_error("one too many"));
        payload.errors.push("pushed directly".into());

        let v = parse(&data_message(&payload).unwrap());
        assert_eq!(v["errors"].as_array().unwrap().len(), MAX_ERRORS);
    }

    #[test]
    fn session_reset_shape() {
        let v = parse(&session_reset_message(250.0).unwrap());
        assert_eq!(v, json!({"type": "session", "action": "reset", "sp": 250}));
    }

    #[test]
    fn history_from_graph() {
        let mut graph = GraphHistory::new();
        graph.add_readings(&[Some(200.0), None, Some(150.04)], 225.0);
        graph.add_readings(&[Some(210.0), Some(90.0), None], 225.0);
        graph.add_readings(&[None, None, None], 250.0);

        let points = history_points(&graph, 1000, 1010);
        assert_eq!(points.iter().map(|p| p.ts).collect::<Vec<_>>(), vec![1000, 1005, 1010]);

        let v = parse(&history_message(&points, 225.0, None, Some(165.0)).unwrap());
        assert_eq!(v["type"], "history");
        assert_eq!(v["sp"], 225);
        assert!(v["meat1Target"].is_null());
        assert_eq!(v["meat2Target"], 165);

        let data = v["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0], json!({"ts": 1000, "pit": 200.0, "meat1": null, "meat2": 150.0, "sp": 225}));
        assert_eq!(data[2]["sp"], 250);
        assert!(data[2]["pit"].is_null());
    }

    #[test]
    fn single_point_history_uses_end_ts() {
        let mut graph = GraphHistory::new();
        graph.add_readings(&[Some(200.0), None, None], 225.0);
        let points = history_points(&graph, 10, 99);
        assert_eq!(points[0].ts, 99);
        assert!(history_points(&GraphHistory::new(), 0, 5).is_empty());
    }
}
