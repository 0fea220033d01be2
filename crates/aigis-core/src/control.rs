use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Manual-control input from an operator.
///
/// Each axis is a unitless stick deflection. `x` and `z` move the vehicle across the ground
/// plane, `y` changes altitude. Only the last received value matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[typeshare]
pub struct ManualControl {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl ManualControl {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns `true` if every axis is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Non-finite components are replaced by zero.
    pub fn sanitized(self) -> Self {
        let fix = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            x: fix(self.x),
            y: fix(self.y),
            z: fix(self.z),
        }
    }
}
