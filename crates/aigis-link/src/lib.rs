mod link_client;
mod messages;
mod transport;

use aigis_core::Command;

pub use link_client::{connect, link_commands, LinkConfig, LinkHandle};
pub use messages::{LinkCommand, LinkMessage};
pub use transport::{LinkTarget, Transport};

/// The most recently decoded state of a real vehicle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkTelemetry {
    /// Degrees
    pub latitude: f64,
    /// Degrees
    pub longitude: f64,
    /// Meters above the home position
    pub relative_altitude: f64,
    /// m/s
    pub groundspeed: f64,
    /// Radians
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    /// `None` until the vehicle reports a level
    pub battery_percent: Option<f64>,
    /// Volts
    pub battery_voltage: f64,
    pub armed: bool,
    pub mode_name: String,
    pub gps_fix: u8,
}

impl LinkTelemetry {
    /// Folds a decoded message into the record.
    pub fn apply(&mut self, msg: &LinkMessage) {
        match msg {
            LinkMessage::Heartbeat { armed, mode } => {
                self.armed = *armed;
                self.mode_name.clone_from(mode);
            }
            LinkMessage::GlobalPositionInt {
                lat,
                lon,
                relative_alt,
            } => {
                self.latitude = *lat as f64 / 1e7;
                self.longitude = *lon as f64 / 1e7;
                self.relative_altitude = *relative_alt as f64 / 1000.0;
            }
            LinkMessage::VfrHud { groundspeed } => self.groundspeed = *groundspeed,
            LinkMessage::Attitude { roll, pitch, yaw } => {
                self.roll = *roll;
                self.pitch = *pitch;
                self.yaw = *yaw;
            }
            LinkMessage::SysStatus {
                voltage_battery,
                battery_remaining,
            } => {
                self.battery_voltage = *voltage_battery as f64 / 1000.0;
                if *battery_remaining >= 0 {
                    self.battery_percent = Some(*battery_remaining as f64);
                }
            }
            LinkMessage::GpsRawInt { fix_type } => self.gps_fix = *fix_type,
            LinkMessage::Unknown => {}
        }
    }
}

/// A connection to real vehicle hardware.
///
/// Implementations must never block: telemetry reads return the last known values and
/// commands are fire-and-forget.
pub trait VehicleLink: Send + Sync {
    fn current_telemetry(&self) -> LinkTelemetry;

    /// Dispatches `command` to the vehicle. Returns `true` if it was handed to the link,
    /// which says nothing about whether the vehicle executed it.
    fn send_command(&self, command: Command) -> bool;
}
