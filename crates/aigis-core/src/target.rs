use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{Position, Vector3};

/// What kind of entity a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[typeshare]
pub enum TargetCategory {
    Civilian,
    Hazard,
    Structure,
}

impl TargetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCategory::Civilian => "CIVILIAN",
            TargetCategory::Hazard => "HAZARD",
            TargetCategory::Structure => "STRUCTURE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[typeshare]
pub enum TargetPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TargetPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPriority::Low => "LOW",
            TargetPriority::Medium => "MEDIUM",
            TargetPriority::High => "HIGH",
            TargetPriority::Critical => "CRITICAL",
        }
    }
}

/// A static point of interest on the ground.
///
/// `detected` only ever goes from `false` to `true`, except through [`Target::clear_detection`]
/// which is reserved for a scenario reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[typeshare]
pub struct Target {
    pub id: u32,
    pub position: Position,
    #[serde(rename = "type")]
    pub category: TargetCategory,
    pub priority: TargetPriority,
    detected: bool,
}

impl Target {
    pub fn new(
        id: u32,
        position: Vector3,
        category: TargetCategory,
        priority: TargetPriority,
    ) -> Self {
        Self {
            id,
            position: position.into(),
            category,
            priority,
            detected: false,
        }
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Distance to `point` across the ground plane, ignoring altitude.
    pub fn planar_distance(&self, point: &Vector3) -> f64 {
        let dx = point.x - self.position.x;
        let dz = point.z - self.position.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Marks the target as detected. Returns `true` only on the first call.
    pub fn mark_detected(&mut self) -> bool {
        if self.detected {
            false
        } else {
            self.detected = true;
            true
        }
    }

    pub fn clear_detection(&mut self) {
        self.detected = false;
    }
}

/// The targets present at the start of every session.
pub fn default_targets() -> Vec<Target> {
    vec![
        Target::new(
            1,
            Vector3::new(10.0, 0.0, 10.0),
            TargetCategory::Civilian,
            TargetPriority::High,
        ),
        Target::new(
            2,
            Vector3::new(-15.0, 0.0, -5.0),
            TargetCategory::Hazard,
            TargetPriority::Critical,
        ),
        Target::new(
            3,
            Vector3::new(5.0, 0.0, -20.0),
            TargetCategory::Structure,
            TargetPriority::Low,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_planar_distance_ignores_altitude() {
        let target = Target::new(
            7,
            Vector3::new(3.0, 0.0, 4.0),
            TargetCategory::Hazard,
            TargetPriority::Medium,
        );
        assert_relative_eq!(target.planar_distance(&Vector3::new(0.0, 120.0, 0.0)), 5.0);
    }

    #[test]
    fn test_mark_detected_once() {
        let mut target = default_targets().remove(0);
        assert!(!target.detected());
        assert!(target.mark_detected());
        assert!(!target.mark_detected());
        assert!(target.detected());
        target.clear_detection();
        assert!(!target.detected());
    }

    #[test]
    fn test_serialized_shape() {
        let target = default_targets().remove(1);
        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value["type"], "HAZARD");
        assert_eq!(value["priority"], "CRITICAL");
        assert_eq!(value["detected"], false);
        assert_eq!(value["position"]["x"], -15.0);
    }
}
