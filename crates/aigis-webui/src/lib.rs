use std::path::PathBuf;

use aigis_core::ManualControl;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

mod routes;
mod server;

pub use server::{router, start, ServerState};

/// Web server settings.
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub port: u16,
    /// Directory of UI assets served at `/`. Without it `/` answers with a status message.
    pub static_dir: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            static_dir: None,
        }
    }
}

/// A message sent by a client over the telemetry WebSocket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[typeshare]
pub enum ClientMessage {
    ManualControl {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        z: f64,
    },
}

impl ClientMessage {
    pub fn manual_control(&self) -> ManualControl {
        match self {
            ClientMessage::ManualControl { x, y, z } => ManualControl::new(*x, *y, *z),
        }
    }
}

/// Generic acknowledgment body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[typeshare]
pub struct StatusResponse {
    pub status: String,
}

/// Body of `GET /` when no static directory is served.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[typeshare]
pub struct RootResponse {
    pub message: String,
}
