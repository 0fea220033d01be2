use aigis_core::{Command, ManualControl, Scenario, TelemetrySnapshot, VehicleMode};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use typeshare::typeshare;

/// A request for the task that owns the HAL.
#[derive(Debug)]
pub enum ControlMsg {
    Command {
        command: Command,
        resp: oneshot::Sender<CommandAck>,
    },
    Scenario {
        scenario: Scenario,
        resp: oneshot::Sender<ScenarioAck>,
    },
    ManualControl(ManualControl),
}

/// Reply to a command request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[typeshare]
pub struct CommandAck {
    /// `"success"`, or `"ignored"` for unknown commands
    pub status: String,
    pub command: String,
    pub drone_state: VehicleMode,
    pub ai_insight: String,
}

/// Reply to a scenario request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[typeshare]
pub struct ScenarioAck {
    /// `"success"`, or `"ignored"` for unknown scenarios
    pub status: String,
    pub scenario: String,
    pub drone_state: VehicleMode,
}

impl CommandAck {
    pub fn accepted(&self) -> bool {
        self.status == "success"
    }
}

impl ScenarioAck {
    pub fn accepted(&self) -> bool {
        self.status == "success"
    }
}

/// Cheap, cloneable access to the HAL for request handlers.
#[derive(Debug, Clone)]
pub struct HalHandle {
    control_tx: mpsc::UnboundedSender<ControlMsg>,
    snapshot_rx: watch::Receiver<TelemetrySnapshot>,
}

impl HalHandle {
    pub(crate) fn new(
        control_tx: mpsc::UnboundedSender<ControlMsg>,
        snapshot_rx: watch::Receiver<TelemetrySnapshot>,
    ) -> Self {
        Self {
            control_tx,
            snapshot_rx,
        }
    }

    /// The most recently published snapshot.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// A receiver that is notified every time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.snapshot_rx.clone()
    }

    /// Dispatches a command by name. Unknown names are acknowledged without effect.
    pub async fn dispatch_command(&self, name: &str) -> CommandAck {
        let Some(command) = Command::from_name(name) else {
            log::warn!("Ignoring unknown command {:?}", name);
            let snapshot = self.telemetry();
            return CommandAck {
                status: "ignored".to_owned(),
                command: name.to_owned(),
                drone_state: snapshot.status.state,
                ai_insight: snapshot.status.ai_insight,
            };
        };

        let (resp, rx) = oneshot::channel();
        self.send(ControlMsg::Command { command, resp });
        match rx.await {
            Ok(ack) => ack,
            Err(_) => {
                let snapshot = self.telemetry();
                CommandAck {
                    status: "unavailable".to_owned(),
                    command: command.name().to_owned(),
                    drone_state: snapshot.status.state,
                    ai_insight: snapshot.status.ai_insight,
                }
            }
        }
    }

    /// Injects a scenario by name. Unknown names are acknowledged without effect.
    pub async fn inject_scenario(&self, name: &str) -> ScenarioAck {
        let Some(scenario) = Scenario::from_name(name) else {
            log::warn!("Ignoring unknown scenario {:?}", name);
            return ScenarioAck {
                status: "ignored".to_owned(),
                scenario: name.to_owned(),
                drone_state: self.telemetry().status.state,
            };
        };

        let (resp, rx) = oneshot::channel();
        self.send(ControlMsg::Scenario { scenario, resp });
        rx.await.unwrap_or_else(|_| ScenarioAck {
            status: "unavailable".to_owned(),
            scenario: scenario.name().to_owned(),
            drone_state: self.telemetry().status.state,
        })
    }

    /// Replaces the manual-control vector. Last writer wins.
    pub fn set_manual_control(&self, control: ManualControl) {
        self.send(ControlMsg::ManualControl(control));
    }

    fn send(&self, msg: ControlMsg) {
        if let Err(err) = self.control_tx.send(msg) {
            log::error!("HAL task is not running, dropping {:?}", err.0);
        }
    }
}
