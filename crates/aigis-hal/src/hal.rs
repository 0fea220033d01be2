use std::time::Instant;

use aigis_advisor::StatusSummary;
use aigis_core::{
    default_targets, Command, EventLog, Health, ManualControl, Scenario, StatusBlock, Target,
    TelemetrySnapshot, Vector3, VehicleMode, VehicleState, BATTERY_FULL,
};
use aigis_link::{LinkConfig, LinkTelemetry, VehicleLink};
use aigis_simulator::Simulation;

use crate::{Cooldown, HalConfig, METERS_PER_DEGREE};

/// Where telemetry comes from.
pub enum Source {
    Simulated(Simulation),
    Hardware(Box<dyn VehicleLink>),
}

/// Scenario presets: mode, battery ceiling, waypoint.
const RESCUE_BATTERY: f64 = 85.0;
const EMERGENCY_BATTERY: f64 = 15.0;
const MAPPING_BATTERY: f64 = 70.0;
const MAPPING_WAYPOINT: (f64, f64) = (25.0, 25.0);
const RESCUE_TARGET_ID: u32 = 1;

/// The vehicle orchestrator.
///
/// Owns the vehicle state, the targets, the event log and the active data source. A
/// single task drives it; everything else talks to it through a [`crate::HalHandle`].
pub struct Hal {
    config: HalConfig,
    source: Source,
    state: VehicleState,
    targets: Vec<Target>,
    control: ManualControl,
    advisory: String,
    events: EventLog,
    cooldown: Cooldown,
    started: Instant,
    /// Last telemetry pulled from the link, hardware mode only
    link_telemetry: Option<LinkTelemetry>,
}

impl Hal {
    pub fn new(config: HalConfig) -> Self {
        let simulation = Simulation::new(config.simulation.clone());
        Self::with_simulation(config, simulation)
    }

    /// Creates a HAL in simulated mode driven by the given simulation.
    pub fn with_simulation(config: HalConfig, simulation: Simulation) -> Self {
        let mut events = EventLog::new(config.event_log_capacity);
        events.push("SYSTEM ONLINE. SIMULATION MODE.");
        Self {
            cooldown: Cooldown::new(config.advisory_cooldown),
            source: Source::Simulated(simulation),
            state: VehicleState::new(),
            targets: default_targets(),
            control: ManualControl::zero(),
            advisory: "SYSTEM STANDBY. AWAITING COMMAND.".to_owned(),
            events,
            started: Instant::now(),
            link_telemetry: None,
            config,
        }
    }

    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn mode(&self) -> VehicleMode {
        self.state.mode
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn advisory(&self) -> &str {
        &self.advisory
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn manual_control(&self) -> ManualControl {
        self.control
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self.source, Source::Hardware(_))
    }

    /// Tries to link to real hardware. On success the HAL stays in hardware mode for the
    /// rest of the session; on failure it stays simulated. Either way this never fails.
    pub async fn connect(&mut self, config: LinkConfig) -> bool {
        if self.is_hardware() {
            log::warn!("Vehicle link already established, ignoring connect request");
            return true;
        }
        match aigis_link::connect(config).await {
            Ok(handle) => {
                self.attach_link(Box::new(handle));
                true
            }
            Err(err) => {
                log::warn!("Hardware link unavailable, staying in simulation: {:#}", err);
                self.events.push("HARDWARE LINK UNAVAILABLE. SIMULATION MODE.");
                false
            }
        }
    }

    /// Switches to hardware mode using an already established link.
    pub fn attach_link(&mut self, link: Box<dyn VehicleLink>) {
        log::info!("Switching to hardware telemetry");
        self.source = Source::Hardware(link);
        self.events.push("HARDWARE LINK ESTABLISHED.");
    }

    /// Advances the HAL by one tick.
    ///
    /// Returns a status summary when an advisory should be requested. The cooldown is
    /// restarted at that point, so the caller must not request one otherwise.
    pub fn update(&mut self, now: Instant) -> Option<StatusSummary> {
        match &mut self.source {
            Source::Hardware(link) => {
                let telemetry = link.current_telemetry();
                self.sync_from_link(telemetry);
            }
            Source::Simulated(simulation) => {
                // Hardware reports its own mode on every sync
                if self.state.mode == VehicleMode::Idle && !self.control.is_zero() {
                    log::info!("Manual input while idle, switching to manual control");
                    self.state.mode = VehicleMode::Manual;
                    self.events.push("MANUAL CONTROL ENGAGED.");
                }
                let detections = simulation.step(&mut self.state, &mut self.targets, self.control);
                for detection in detections {
                    let text = detection.advisory();
                    self.events.push(text.clone());
                    self.advisory = text;
                }
            }
        }

        if self.state.mode != VehicleMode::Idle && self.cooldown.trigger(now) {
            Some(self.status_summary())
        } else {
            None
        }
    }

    fn sync_from_link(&mut self, telemetry: LinkTelemetry) {
        // No position fix yet
        if telemetry.latitude != 0.0 || telemetry.longitude != 0.0 {
            let origin = self.config.origin;
            self.state.position = Vector3::new(
                (telemetry.longitude - origin.longitude) * METERS_PER_DEGREE,
                telemetry.relative_altitude,
                (telemetry.latitude - origin.latitude) * METERS_PER_DEGREE,
            );
        }
        if let Some(battery) = telemetry.battery_percent {
            self.state.set_battery(battery);
        }
        self.state.velocity = telemetry.groundspeed;
        self.state.mode = VehicleMode::from_link_mode(&telemetry.mode_name, telemetry.armed);
        self.link_telemetry = Some(telemetry);
    }

    pub fn status_summary(&self) -> StatusSummary {
        StatusSummary {
            mode: self.state.mode,
            battery: self.state.battery(),
            altitude: self.state.altitude(),
        }
    }

    /// Applies an operator command. Every command is accepted in every mode.
    pub fn dispatch_command(&mut self, command: Command) {
        if let Source::Hardware(link) = &self.source {
            if !link.send_command(command) {
                log::debug!("Command {} has no hardware equivalent", command);
            }
        }

        self.state.mode = command.target_mode();
        match command {
            Command::Takeoff | Command::Land | Command::Emergency => self.state.waypoint = None,
            Command::Rtl => self.state.waypoint = Some(Vector3::zeros()),
            Command::Mission => self.state.waypoint = self.nearest_undetected_target(),
            Command::Scan => {}
        }
        self.advisory = command.acknowledgment().to_owned();
        self.events
            .push(format!("CMD {}: {}", command.name().to_uppercase(), self.advisory));
        log::info!("Command {} dispatched, mode now {}", command, self.state.mode);
    }

    fn nearest_undetected_target(&self) -> Option<Vector3> {
        let here = self.state.position;
        self.targets
            .iter()
            .filter(|t| !t.detected())
            .min_by(|a, b| a.planar_distance(&here).total_cmp(&b.planar_distance(&here)))
            .map(|t| t.position.into())
    }

    /// Loads a demonstration scenario.
    pub fn inject_scenario(&mut self, scenario: Scenario) {
        let advisory = match scenario {
            Scenario::Rescue => {
                self.state.mode = VehicleMode::Searching;
                self.cap_battery(RESCUE_BATTERY);
                self.state.waypoint = self
                    .targets
                    .iter()
                    .find(|t| t.id == RESCUE_TARGET_ID)
                    .map(|t| t.position.into());
                "SCENARIO RESCUE: CIVILIAN SIGNAL REPORTED. SEARCH PATTERN ENGAGED."
            }
            Scenario::Emergency => {
                self.state.mode = VehicleMode::Emergency;
                self.cap_battery(EMERGENCY_BATTERY);
                self.state.waypoint = None;
                "SCENARIO EMERGENCY: CRITICAL POWER FAILURE. CONTROLLED DESCENT."
            }
            Scenario::Mapping => {
                self.state.mode = VehicleMode::Scanning;
                self.cap_battery(MAPPING_BATTERY);
                let (x, z) = MAPPING_WAYPOINT;
                self.state.waypoint = Some(Vector3::new(x, 0.0, z));
                "SCENARIO MAPPING: TERRAIN SURVEY GRID LOADED."
            }
            Scenario::Reset => {
                self.state = VehicleState::new();
                self.state.set_battery(BATTERY_FULL);
                self.control = ManualControl::zero();
                self.targets.iter_mut().for_each(Target::clear_detection);
                "SCENARIO RESET: ALL SYSTEMS RESTORED. AWAITING COMMAND."
            }
        };
        self.advisory = advisory.to_owned();
        self.events.push(advisory);
        log::info!("Scenario {} injected, mode now {}", scenario, self.state.mode);
    }

    /// Scenario batteries never raise the level, only reset does.
    fn cap_battery(&mut self, ceiling: f64) {
        self.state.set_battery(self.state.battery().min(ceiling));
    }

    /// Stores the operator's manual-control vector. Ignored by the hardware source.
    pub fn set_manual_control(&mut self, control: ManualControl) {
        self.control = control.sanitized();
    }

    /// Replaces the advisory line with a completed advisory.
    pub fn apply_advisory(&mut self, text: String) {
        self.events.push(text.clone());
        self.advisory = text;
    }

    /// Whole seconds since construction.
    pub fn mission_time(&self) -> u32 {
        u32::try_from(self.started.elapsed().as_secs()).unwrap_or(u32::MAX)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let link = self
            .link_telemetry
            .as_ref()
            .filter(|_| self.is_hardware());
        let health = match link {
            Some(t) => Health::linked(t.gps_fix, t.armed),
            None => Health::simulated(!matches!(
                self.state.mode,
                VehicleMode::Idle | VehicleMode::Landed
            )),
        };

        TelemetrySnapshot {
            position: self.state.position.into(),
            status: StatusBlock {
                battery: round2(self.state.battery()),
                signal: self.state.signal,
                velocity: round2(self.state.velocity),
                altitude: round2(self.state.altitude()),
                mission_time: self.mission_time(),
                state: self.state.mode,
                ai_insight: self.advisory.clone(),
                hardware_link: self.is_hardware(),
                link_mode: link.map(|t| t.mode_name.clone()),
                battery_voltage: link.map(|t| round2(t.battery_voltage)),
                waypoint: self.state.waypoint.map(Into::into),
            },
            health,
            targets: self.targets.clone(),
            logs: self.events.to_vec(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
