use serde::{Deserialize, Serialize};

/// A vehicle message as produced by the upstream protocol decoder.
///
/// Field units follow the flight controller: degE7 for coordinates, mm for altitude,
/// mV for voltage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkMessage {
    Heartbeat {
        armed: bool,
        mode: String,
    },
    GlobalPositionInt {
        lat: i32,
        lon: i32,
        relative_alt: i32,
    },
    VfrHud {
        groundspeed: f64,
    },
    Attitude {
        roll: f64,
        pitch: f64,
        yaw: f64,
    },
    SysStatus {
        voltage_battery: u16,
        /// Remaining capacity in percent, `-1` if unknown
        battery_remaining: i8,
    },
    GpsRawInt {
        fix_type: u8,
    },
    #[serde(other)]
    Unknown,
}

/// A high-level action sent to the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkCommand {
    Arm,
    Takeoff { altitude: f64 },
    SetMode { mode: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        let msg: LinkMessage =
            serde_json::from_str(r#"{"type":"GLOBAL_POSITION_INT","lat":-235505200,"lon":-466333080,"relative_alt":12500}"#)
                .unwrap();
        assert_eq!(
            msg,
            LinkMessage::GlobalPositionInt {
                lat: -235505200,
                lon: -466333080,
                relative_alt: 12500
            }
        );

        let msg: LinkMessage =
            serde_json::from_str(r#"{"type":"HEARTBEAT","armed":true,"mode":"GUIDED"}"#).unwrap();
        assert!(matches!(msg, LinkMessage::Heartbeat { armed: true, .. }));
    }

    #[test]
    fn test_unknown_message_type() {
        let msg: LinkMessage = serde_json::from_str(r#"{"type":"RC_CHANNELS"}"#).unwrap();
        assert_eq!(msg, LinkMessage::Unknown);
    }

    #[test]
    fn test_command_encoding() {
        assert_eq!(
            serde_json::to_string(&LinkCommand::Arm).unwrap(),
            r#"{"type":"ARM"}"#
        );
        assert_eq!(
            serde_json::to_string(&LinkCommand::SetMode { mode: "RTL".into() }).unwrap(),
            r#"{"type":"SET_MODE","mode":"RTL"}"#
        );
    }
}
