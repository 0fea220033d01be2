mod cooldown;
mod hal;
mod handle;
mod registry;
mod scheduler;

use std::time::Duration;

use aigis_core::EVENT_LOG_CAPACITY;
use aigis_simulator::SimulationConfig;

pub use cooldown::Cooldown;
pub use hal::{Hal, Source};
pub use handle::{CommandAck, ControlMsg, HalHandle, ScenarioAck};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use scheduler::{Scheduler, TelemetryFrame};

/// Meters per degree of latitude, also used for longitude near the origin.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Geographic point that maps onto the local origin in hardware mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoOrigin {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for GeoOrigin {
    fn default() -> Self {
        Self {
            latitude: -23.55052,
            longitude: -46.633308,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HalConfig {
    pub simulation: SimulationConfig,
    /// Minimum time between two advisory requests
    pub advisory_cooldown: Duration,
    pub event_log_capacity: usize,
    pub origin: GeoOrigin,
    /// Period of the update loop
    pub update_interval: Duration,
    /// Period of the broadcast loop
    pub broadcast_interval: Duration,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            advisory_cooldown: Duration::from_secs(10),
            event_log_capacity: EVENT_LOG_CAPACITY,
            origin: GeoOrigin::default(),
            update_interval: Duration::from_millis(50),
            broadcast_interval: Duration::from_millis(80),
        }
    }
}
