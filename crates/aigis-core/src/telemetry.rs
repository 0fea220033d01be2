use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{LogEntry, Target, Vector3, VehicleMode};

/// A point in the local frame, in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[typeshare]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vector3> for Position {
    fn from(v: Vector3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Position> for Vector3 {
    fn from(p: Position) -> Self {
        Vector3::new(p.x, p.y, p.z)
    }
}

/// Scalar vehicle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[typeshare]
pub struct StatusBlock {
    /// Remaining battery in percent, `0..=100`
    pub battery: f64,
    /// Link signal strength in dBm
    pub signal: i32,
    /// Ground speed in m/s
    pub velocity: f64,
    /// Altitude above the local origin in meters
    pub altitude: f64,
    /// Whole seconds since the server started
    pub mission_time: u32,
    pub state: VehicleMode,
    /// The current advisory line
    pub ai_insight: String,
    /// Whether telemetry comes from a real vehicle
    pub hardware_link: bool,
    /// Mode name exactly as reported by the flight controller, hardware mode only
    pub link_mode: Option<String>,
    /// Battery voltage in volts, hardware mode only
    pub battery_voltage: Option<f64>,
    pub waypoint: Option<Position>,
}

/// Named diagnostic strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[typeshare]
pub struct Health {
    pub gps: String,
    pub imu: String,
    pub ekf: String,
    pub link: String,
    pub motors: String,
}

impl Health {
    pub fn simulated(armed: bool) -> Self {
        Self {
            gps: "3D FIX".to_owned(),
            imu: "OK".to_owned(),
            ekf: "OK".to_owned(),
            link: "SIMULATED".to_owned(),
            motors: motors_label(armed).to_owned(),
        }
    }

    /// Health as reported over a vehicle link. `fix_type` follows the usual GPS fix
    /// numbering (0-1 no fix, 2 2D, 3 3D, 4+ differential/RTK).
    pub fn linked(fix_type: u8, armed: bool) -> Self {
        let gps = match fix_type {
            0 | 1 => "NO FIX",
            2 => "2D FIX",
            3 => "3D FIX",
            4 => "DGPS",
            _ => "RTK",
        };
        Self {
            gps: gps.to_owned(),
            imu: "OK".to_owned(),
            ekf: if fix_type >= 3 { "OK" } else { "DEGRADED" }.to_owned(),
            link: "MAVLINK".to_owned(),
            motors: motors_label(armed).to_owned(),
        }
    }
}

fn motors_label(armed: bool) -> &'static str {
    if armed {
        "ARMED"
    } else {
        "DISARMED"
    }
}

/// A point-in-time copy of everything a viewer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[typeshare]
pub struct TelemetrySnapshot {
    pub position: Position,
    pub status: StatusBlock,
    pub health: Health,
    pub targets: Vec<Target>,
    /// Newest first
    pub logs: Vec<LogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_conversion() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let p: Position = v.into();
        assert_eq!(p, Position { x: 1.0, y: 2.0, z: 3.0 });
        assert_eq!(Vector3::from(p), v);
    }

    #[test]
    fn test_linked_health() {
        let health = Health::linked(3, true);
        assert_eq!(health.gps, "3D FIX");
        assert_eq!(health.ekf, "OK");
        assert_eq!(health.motors, "ARMED");

        let health = Health::linked(0, false);
        assert_eq!(health.gps, "NO FIX");
        assert_eq!(health.ekf, "DEGRADED");
        assert_eq!(health.motors, "DISARMED");
    }
}
