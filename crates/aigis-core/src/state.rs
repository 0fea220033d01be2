use crate::{Vector3, VehicleMode};

pub const BATTERY_FULL: f64 = 100.0;

/// Mutable vehicle state owned by the HAL and advanced by the active data source.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub position: Vector3,
    battery: f64,
    /// Signal strength in dBm
    pub signal: i32,
    /// Ground speed in m/s
    pub velocity: f64,
    pub mode: VehicleMode,
    /// Where the vehicle is steering to, if anywhere
    pub waypoint: Option<Vector3>,
}

impl VehicleState {
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            battery: BATTERY_FULL,
            signal: -45,
            velocity: 0.0,
            mode: VehicleMode::Idle,
            waypoint: None,
        }
    }

    pub fn altitude(&self) -> f64 {
        self.position.y
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }

    /// Sets the battery level, clamped to `0..=100`. NaN is treated as empty.
    pub fn set_battery(&mut self, percent: f64) {
        self.battery = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, BATTERY_FULL)
        };
    }

    /// Lowers the battery by `amount` percent, never below zero. Negative amounts are ignored.
    pub fn drain(&mut self, amount: f64) {
        if amount > 0.0 {
            self.set_battery(self.battery - amount);
        }
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::new()
    }
}
