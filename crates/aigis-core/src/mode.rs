use std::fmt;

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// The mode tag of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[typeshare]
pub enum VehicleMode {
    #[default]
    Idle,
    Flying,
    Landed,
    Returning,
    Searching,
    Scanning,
    Manual,
    Emergency,
}

impl VehicleMode {
    pub const ALL: [VehicleMode; 8] = [
        VehicleMode::Idle,
        VehicleMode::Flying,
        VehicleMode::Landed,
        VehicleMode::Returning,
        VehicleMode::Searching,
        VehicleMode::Scanning,
        VehicleMode::Manual,
        VehicleMode::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleMode::Idle => "IDLE",
            VehicleMode::Flying => "FLYING",
            VehicleMode::Landed => "LANDED",
            VehicleMode::Returning => "RETURNING",
            VehicleMode::Searching => "SEARCHING",
            VehicleMode::Scanning => "SCANNING",
            VehicleMode::Manual => "MANUAL",
            VehicleMode::Emergency => "EMERGENCY",
        }
    }

    /// Modes in which the vehicle is airborne and moving under its own power.
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            VehicleMode::Flying
                | VehicleMode::Returning
                | VehicleMode::Searching
                | VehicleMode::Scanning
                | VehicleMode::Manual
        )
    }

    /// Maps a flight-controller mode name onto the closed mode set.
    ///
    /// A disarmed vehicle is always `Idle`. Unknown names while armed map to `Flying`.
    pub fn from_link_mode(name: &str, armed: bool) -> VehicleMode {
        if !armed {
            return VehicleMode::Idle;
        }
        match name.trim().to_ascii_uppercase().as_str() {
            "RTL" | "SMART_RTL" => VehicleMode::Returning,
            "LAND" => VehicleMode::Landed,
            "MANUAL" | "STABILIZE" | "ACRO" | "ALT_HOLD" | "POSHOLD" => VehicleMode::Manual,
            _ => VehicleMode::Flying,
        }
    }
}

impl fmt::Display for VehicleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator flight command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[typeshare]
pub enum Command {
    Takeoff,
    Land,
    Rtl,
    Scan,
    Mission,
    Emergency,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Takeoff,
        Command::Land,
        Command::Rtl,
        Command::Scan,
        Command::Mission,
        Command::Emergency,
    ];

    /// Parses a command name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Command> {
        let name = name.trim().to_ascii_lowercase();
        Command::ALL.into_iter().find(|cmd| cmd.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Takeoff => "takeoff",
            Command::Land => "land",
            Command::Rtl => "rtl",
            Command::Scan => "scan",
            Command::Mission => "mission",
            Command::Emergency => "emergency",
        }
    }

    /// The mode the vehicle is put into by this command.
    pub fn target_mode(&self) -> VehicleMode {
        match self {
            Command::Takeoff => VehicleMode::Flying,
            Command::Land => VehicleMode::Landed,
            Command::Rtl => VehicleMode::Returning,
            Command::Scan => VehicleMode::Scanning,
            Command::Mission => VehicleMode::Searching,
            Command::Emergency => VehicleMode::Emergency,
        }
    }

    /// Fixed acknowledgment shown as the advisory text once the command is dispatched.
    pub fn acknowledgment(&self) -> &'static str {
        match self {
            Command::Takeoff => "INITIATING ENGINE START. ASCENT TO 120M.",
            Command::Land => "LANDING SEQUENCE ENGAGED. FINDING LEVEL TERRAIN.",
            Command::Rtl => "RETURN TO LAUNCH TRIGGERED. REVERTING VIA SAFE CORRIDOR.",
            Command::Scan => "THERMAL SCAN ACTIVE. SWEEPING SECTOR FOR HEAT SIGNATURES.",
            Command::Mission => "UPLOADING RESCUE WAYPOINT DATA. PATH OPTIMIZED.",
            Command::Emergency => "EMERGENCY PROTOCOL ACTIVE. ALL SYSTEMS TO MANUAL OVERRIDE.",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A canned demonstration scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[typeshare]
pub enum Scenario {
    Rescue,
    Emergency,
    Mapping,
    Reset,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Rescue,
        Scenario::Emergency,
        Scenario::Mapping,
        Scenario::Reset,
    ];

    pub fn from_name(name: &str) -> Option<Scenario> {
        let name = name.trim().to_ascii_lowercase();
        Scenario::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Rescue => "rescue",
            Scenario::Emergency => "emergency",
            Scenario::Mapping => "mapping",
            Scenario::Reset => "reset",
        }
    }

    pub fn get_names() -> Vec<&'static str> {
        Scenario::ALL.iter().map(|s| s.name()).collect()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
