use std::sync::Arc;

use aigis_core::{ManualControl, Scenario, TelemetrySnapshot};
use aigis_hal::{CommandAck, HalHandle, ScenarioAck, TelemetryFrame};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Json, Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::{server::ServerState, ClientMessage, RootResponse, StatusResponse};

/// Frames queued per subscriber before it counts as too slow
const SUBSCRIBER_QUEUE: usize = 16;

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AIGIS Tactical UAV Server Running".to_owned(),
    })
}

pub async fn get_status(state: State<Arc<ServerState>>) -> Json<TelemetrySnapshot> {
    Json(state.hal.telemetry())
}

pub async fn get_scenarios() -> Json<Vec<&'static str>> {
    Json(Scenario::get_names())
}

pub async fn post_command(
    state: State<Arc<ServerState>>,
    Path(cmd): Path<String>,
) -> Json<CommandAck> {
    Json(state.hal.dispatch_command(&cmd).await)
}

pub async fn post_scenario(
    state: State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Json<ScenarioAck> {
    Json(state.hal.inject_scenario(&name).await)
}

pub async fn post_manual_control(
    state: State<Arc<ServerState>>,
    Json(control): Json<ManualControl>,
) -> Json<StatusResponse> {
    state.hal.set_manual_control(control);
    Json(StatusResponse {
        status: "success".to_owned(),
    })
}

pub async fn websocket(ws: WebSocketUpgrade, state: State<Arc<ServerState>>) -> impl IntoResponse {
    let state = Arc::clone(&state.0);
    ws.on_upgrade(|socket| async move {
        let (id, rx) = state.registry.subscribe_channel(SUBSCRIBER_QUEUE);
        handle_ws_conn(state.hal.clone(), rx, socket).await;
        state.registry.unsubscribe(id);
        log::debug!("Websocket {} closed", id);
    })
}

async fn handle_ws_conn(hal: HalHandle, mut rx: mpsc::Receiver<TelemetryFrame>, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(msg)) => handle_ws_msg(&hal, msg),
                Some(Err(err)) => {
                    log::debug!("Websocket receive error: {}", err);
                    break;
                }
                None => break,
            },
            frame = rx.recv() => match frame {
                Some(frame) => {
                    if let Err(err) = sink.send(Message::Text(frame.to_string())).await {
                        log::debug!("Failed to send telemetry: {}", err);
                        break;
                    }
                }
                // Evicted by the registry
                None => break,
            },
        }
    }

    if let Err(err) = sink.close().await {
        log::debug!("Failed to close websocket: {}", err);
    }
}

fn handle_ws_msg(hal: &HalHandle, msg: Message) {
    if let Message::Text(text) = msg {
        if let Some(control) = parse_client_message(&text) {
            hal.set_manual_control(control);
        }
    }
}

/// Extracts a manual-control vector from a client frame. Anything else is ignored.
fn parse_client_message(text: &str) -> Option<ManualControl> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => Some(msg.manual_control()),
        Err(err) => {
            log::debug!("Ignoring client message {:?}: {}", text, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aigis_advisor::InsightAdvisor;
    use aigis_core::VehicleMode;
    use aigis_hal::{ConnectionRegistry, Hal, HalConfig, Scheduler};
    use tokio::sync::broadcast;

    use super::*;

    fn spawn_state() -> (Arc<ServerState>, broadcast::Sender<()>) {
        let config = HalConfig {
            update_interval: Duration::from_millis(5),
            ..Default::default()
        };
        let registry = Arc::new(ConnectionRegistry::new());
        let (scheduler, hal) = Scheduler::new(
            Hal::new(config),
            Arc::new(InsightAdvisor::local()),
            Arc::clone(&registry),
        );
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(scheduler.run(shutdown_rx));
        (Arc::new(ServerState { hal, registry }), shutdown_tx)
    }

    #[test]
    fn test_parse_client_message() {
        assert_eq!(
            parse_client_message(r#"{"type":"manual_control","x":0.5,"y":-1,"z":0}"#),
            Some(ManualControl::new(0.5, -1.0, 0.0))
        );
        assert_eq!(
            parse_client_message(r#"{"type":"manual_control","z":1}"#),
            Some(ManualControl::new(0.0, 0.0, 1.0))
        );
        assert_eq!(parse_client_message(r#"{"type":"ping"}"#), None);
        assert_eq!(parse_client_message("not json"), None);
    }

    #[tokio::test]
    async fn test_root() {
        let Json(body) = root().await;
        assert_eq!(body.message, "AIGIS Tactical UAV Server Running");
    }

    #[tokio::test]
    async fn test_command_and_status() {
        let (state, shutdown_tx) = spawn_state();

        let Json(ack) = post_command(State(Arc::clone(&state)), Path("rtl".into())).await;
        assert_eq!(ack.status, "success");
        assert_eq!(ack.drone_state, VehicleMode::Returning);

        let Json(ack) = post_command(State(Arc::clone(&state)), Path("hover".into())).await;
        assert_eq!(ack.status, "ignored");

        let Json(snapshot) = get_status(State(Arc::clone(&state))).await;
        assert_eq!(snapshot.status.state, VehicleMode::Returning);

        let Json(ack) = post_scenario(State(Arc::clone(&state)), Path("reset".into())).await;
        assert_eq!(ack.drone_state, VehicleMode::Idle);

        shutdown_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn test_manual_control_promotes_idle() {
        let (state, shutdown_tx) = spawn_state();
        let Json(resp) = post_manual_control(
            State(Arc::clone(&state)),
            Json(ManualControl::new(1.0, 0.0, 0.0)),
        )
        .await;
        assert_eq!(resp.status, "success");

        let mut rx = state.hal.subscribe();
        let promoted = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.borrow_and_update().status.state != VehicleMode::Manual {
                rx.changed().await.unwrap();
            }
        })
        .await;
        assert!(promoted.is_ok());

        shutdown_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn test_scenario_names() {
        let Json(names) = get_scenarios().await;
        assert_eq!(names, vec!["rescue", "emergency", "mapping", "reset"]);
    }
}
