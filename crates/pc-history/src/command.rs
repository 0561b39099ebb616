//! Inbound client commands.
//!
//! Clients send one JSON object per message, tagged by `type`:
//!
//! | message | command |
//! |---|---|
//! | `{"type":"set","sp":250}` | [`Command::SetSetpoint`] |
//! | `{"type":"alarm","meat1Target":203,"meat2Target":null}` | [`Command::Alarm`] |
//! | `{"type":"config","fanMode":"fan_only"}` | [`Command::SetFanMode`] |
//! | `{"type":"session","action":"new"}` | [`Command::Session`] |
//!
//! In an alarm, a missing target leaves that target alone and `null` clears
//! it. Anything that does not parse into one of these is
//! [`Command::Unknown`].

use pc_controls::FanMode;
use serde::{Deserialize, Deserializer};

/// Session actions a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Start a new cook.
    New,
}

/// A parsed client message.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    #[serde(rename = "set")]
    SetSetpoint { sp: f64 },
    /// `None`: unchanged. `Some(None)`: clear. `Some(Some(t))`: set.
    Alarm {
        #[serde(rename = "meat1Target", default, deserialize_with = "present")]
        meat1_target: Option<Option<f64>>,
        #[serde(rename = "meat2Target", default, deserialize_with = "present")]
        meat2_target: Option<Option<f64>>,
    },
    #[serde(rename = "config")]
    SetFanMode {
        #[serde(rename = "fanMode")]
        fan_mode: FanMode,
    },
    Session { action: SessionAction },
    #[serde(other)]
    Unknown,
}

/// Distinguishes an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// Parse one client message. Malformed JSON, unknown types and unusable
/// fields all yield [`Command::Unknown`].
pub fn parse_command(text: &str) -> Command {
    match serde_json::from_str(text) {
        Ok(command) => command,
        Err(err) => {
            tracing::debug!(%err, "unparseable client command");
            Command::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_setpoint() {
        assert_eq!(parse_command(r#"{"type":"set","sp":250}"#), Command::SetSetpoint { sp: 250.0 });
        assert_eq!(
            parse_command(r#"{"sp":237.5,"type":"set"}"#),
            Command::SetSetpoint { sp: 237.5 }
        );
        assert_eq!(parse_command(r#"{"type":"set"}"#), Command::Unknown);
        assert_eq!(parse_command(r#"{"type":"set","sp":"hot"}"#), Command::Unknown);
    }

    #[test]
    fn alarm_targets_are_tri_state() {
        assert_eq!(
            parse_command(r#"{"type":"alarm","meat1Target":203,"meat2Target":null}"#),
            Command::Alarm {
                meat1_target: Some(Some(203.0)),
                meat2_target: Some(None),
            }
        );
        assert_eq!(
            parse_command(r#"{"type":"alarm","meat2Target":165.5,"pitBand":15}"#),
            Command::Alarm {
                meat1_target: None,
                meat2_target: Some(Some(165.5)),
            }
        );
        assert_eq!(
            parse_command(r#"{"type":"alarm"}"#),
            Command::Alarm {
                meat1_target: None,
                meat2_target: None,
            }
        );
    }

    #[test]
    fn fan_mode() {
        assert_eq!(
            parse_command(r#"{"type":"config","fanMode":"damper_primary"}"#),
            Command::SetFanMode {
                fan_mode: FanMode::DamperPrimary
            }
        );
        assert_eq!(parse_command(r#"{"type":"config","fanMode":"turbo"}"#), Command::Unknown);
        assert_eq!(parse_command(r#"{"type":"config"}"#), Command::Unknown);
    }

    #[test]
    fn new_session() {
        assert_eq!(
            parse_command(r#"{"type":"session","action":"new"}"#),
            Command::Session {
                action: SessionAction::New
            }
        );
        assert_eq!(
            parse_command(r#"{"type":"session","action":"download","format":"csv"}"#),
            Command::Unknown
        );
    }

    #[test]
    fn malformed_input_is_unknown() {
        for text in [
            "",
            "not json",
            r#"{"type":"set","sp":250"#,
            "[1, 2, 3]",
            r#"{"sp":250}"#,
            r#"{"type":"reboot"}"#,
            r#"{"type":42}"#,
        ] {
            assert_eq!(parse_command(text), Command::Unknown, "{text}");
        }
    }
}
