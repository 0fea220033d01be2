mod control;
mod event_log;
mod mode;
mod state;
mod target;
mod telemetry;

pub use control::*;
pub use event_log::*;
pub use mode::*;
pub use state::*;
pub use target::*;
pub use telemetry::*;

/// Vector in the local frame, in meters. `x` and `z` span the ground plane, `y` points up.
pub type Vector3 = nalgebra::Vector3<f64>;
