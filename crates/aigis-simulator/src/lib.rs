use aigis_core::{
    ManualControl, Target, TargetCategory, TargetPriority, Vector3, VehicleMode, VehicleState,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Duration of one step in seconds, used to derive velocity
    pub dt: f64,

    // MOTION
    /// Half-width of the uniform lateral jitter applied per step when no waypoint is set, in m
    pub lateral_jitter: f64,
    /// Distance travelled toward the waypoint per step, in m
    pub waypoint_step: f64,
    /// Distance under which the vehicle snaps onto the waypoint, in m
    pub arrival_epsilon: f64,
    /// Altitude the motion modes climb toward, in m
    pub cruise_altitude: f64,
    /// Maximum altitude change per step while seeking cruise altitude, in m
    pub climb_rate: f64,
    /// Half-width of the altitude jitter in motion modes, in m
    pub altitude_jitter: f64,

    // MANUAL CONTROL
    /// Meters per step for a unit stick deflection
    pub manual_sensitivity: f64,
    pub min_altitude: f64,
    pub max_altitude: f64,

    // GROUND / EMERGENCY
    /// Altitude the vehicle rests at while idle or landed, in m
    pub ground_altitude: f64,
    pub ground_jitter: f64,
    /// Altitude lost per step in emergency descent, in m
    pub emergency_descent_rate: f64,
    /// Lowest altitude reached by an emergency descent, in m
    pub emergency_floor: f64,

    // BATTERY (percent per step)
    pub motion_drain: f64,
    pub emergency_drain: f64,
    pub idle_drain: f64,

    // SENSING
    /// Planar distance under which a target counts as detected, in m
    pub detection_radius: f64,
    /// Nominal signal strength in dBm
    pub signal_base: i32,
    /// Half-width of the integer signal jitter in dBm
    pub signal_jitter: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            dt: 0.05,

            // MOTION
            lateral_jitter: 0.1,
            waypoint_step: 0.5,
            arrival_epsilon: 0.5,
            cruise_altitude: 120.0,
            climb_rate: 2.0,
            altitude_jitter: 0.5,

            // MANUAL CONTROL
            manual_sensitivity: 0.5,
            min_altitude: 2.0,
            max_altitude: 400.0,

            // GROUND / EMERGENCY
            ground_altitude: 5.0,
            ground_jitter: 0.1,
            emergency_descent_rate: 0.5,
            emergency_floor: 0.0,

            // BATTERY
            motion_drain: 0.01,
            emergency_drain: 0.05,
            idle_drain: 0.001,

            // SENSING
            detection_radius: 8.0,
            signal_base: -45,
            signal_jitter: 5,
        }
    }
}

/// A target that came within detection range during a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub target_id: u32,
    pub category: TargetCategory,
    pub priority: TargetPriority,
}

impl Detection {
    pub fn advisory(&self) -> String {
        format!(
            "TARGET {} DETECTED: {} // PRIORITY {}",
            self.target_id,
            self.category.as_str(),
            self.priority.as_str()
        )
    }
}

/// Stochastic stand-in for the vehicle's flight dynamics.
pub struct Simulation {
    config: SimulationConfig,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a simulation with a deterministic noise source.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advances `state` by one step and runs the detection pass over `targets`.
    ///
    /// Returns the targets detected during this step.
    pub fn step(
        &mut self,
        state: &mut VehicleState,
        targets: &mut [Target],
        control: ManualControl,
    ) -> Vec<Detection> {
        let control = control.sanitized();
        match state.mode {
            mode if mode.is_motion() => self.step_motion(state, control),
            VehicleMode::Emergency => self.step_emergency(state),
            _ => self.step_ground(state),
        }

        let jitter = self.config.signal_jitter.abs();
        state.signal = self.config.signal_base + self.rng.gen_range(-jitter..=jitter);

        self.detect(&state.position, targets)
    }

    fn step_motion(&mut self, state: &mut VehicleState, control: ManualControl) {
        let cfg = &self.config;
        let start = state.position;

        // Ground plane
        match state.waypoint {
            Some(waypoint) => {
                let delta = Vector3::new(waypoint.x - start.x, 0.0, waypoint.z - start.z);
                let dist = delta.norm();
                if dist <= cfg.arrival_epsilon.max(cfg.waypoint_step) {
                    state.position.x = waypoint.x;
                    state.position.z = waypoint.z;
                } else {
                    state.position += delta / dist * cfg.waypoint_step;
                }
            }
            None => {
                let j = cfg.lateral_jitter.abs();
                if j > 0.0 {
                    state.position.x += self.rng.gen_range(-j..=j);
                    state.position.z += self.rng.gen_range(-j..=j);
                }
            }
        }

        let climb = (cfg.cruise_altitude - state.position.y).clamp(-cfg.climb_rate, cfg.climb_rate);
        state.position.y += climb;
        let j = cfg.altitude_jitter.abs();
        if j > 0.0 {
            state.position.y += self.rng.gen_range(-j..=j);
        }

        // Operator input rides on top of the cruise climb
        if !control.is_zero() {
            state.position.x += control.x * cfg.manual_sensitivity;
            state.position.y += control.y * cfg.manual_sensitivity;
            state.position.z += control.z * cfg.manual_sensitivity;
            state.position.y = state.position.y.clamp(cfg.min_altitude, cfg.max_altitude);
        }

        let moved = Vector3::new(
            state.position.x - start.x,
            0.0,
            state.position.z - start.z,
        );
        state.velocity = moved.norm() / cfg.dt;
        state.drain(cfg.motion_drain);
    }

    fn step_emergency(&mut self, state: &mut VehicleState) {
        let cfg = &self.config;
        let altitude = state.position.y;
        if altitude > cfg.emergency_floor {
            state.position.y = (altitude - cfg.emergency_descent_rate).max(cfg.emergency_floor);
        }
        state.velocity = (altitude - state.position.y) / cfg.dt;
        state.drain(cfg.emergency_drain);
    }

    fn step_ground(&mut self, state: &mut VehicleState) {
        let cfg = &self.config;
        let j = cfg.ground_jitter.abs();
        let jitter = if j > 0.0 {
            self.rng.gen_range(-j..=j)
        } else {
            0.0
        };
        state.position.y = cfg.ground_altitude + jitter;
        state.velocity = 0.0;
        state.drain(cfg.idle_drain);
    }

    fn detect(&self, position: &Vector3, targets: &mut [Target]) -> Vec<Detection> {
        let mut detections = Vec::new();
        for target in targets.iter_mut().filter(|t| !t.detected()) {
            if target.planar_distance(position) < self.config.detection_radius
                && target.mark_detected()
            {
                log::info!("Target {} detected ({})", target.id, target.category.as_str());
                detections.push(Detection {
                    target_id: target.id,
                    category: target.category,
                    priority: target.priority,
                });
            }
        }
        detections
    }
}
