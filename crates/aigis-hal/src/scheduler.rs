use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use aigis_advisor::{Advisor, StatusSummary};
use aigis_core::TelemetrySnapshot;
use tokio::{
    sync::{broadcast, mpsc, watch},
    time::MissedTickBehavior,
};

use crate::{
    handle::{CommandAck, ControlMsg, HalHandle, ScenarioAck},
    ConnectionRegistry, Hal,
};

/// A snapshot serialized once and shared by every subscriber.
pub type TelemetryFrame = Arc<str>;

/// Drives the HAL: the update loop owns it and is its only writer, the broadcast loop
/// fans published snapshots out to subscribers.
pub struct Scheduler {
    hal: Hal,
    advisor: Arc<dyn Advisor>,
    registry: Arc<ConnectionRegistry<TelemetryFrame>>,
    control_rx: mpsc::UnboundedReceiver<ControlMsg>,
    advisory_tx: mpsc::UnboundedSender<String>,
    advisory_rx: mpsc::UnboundedReceiver<String>,
    snapshot_tx: watch::Sender<TelemetrySnapshot>,
}

impl Scheduler {
    pub fn new(
        hal: Hal,
        advisor: Arc<dyn Advisor>,
        registry: Arc<ConnectionRegistry<TelemetryFrame>>,
    ) -> (Self, HalHandle) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (advisory_tx, advisory_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(hal.snapshot());
        let scheduler = Self {
            hal,
            advisor,
            registry,
            control_rx,
            advisory_tx,
            advisory_rx,
            snapshot_tx,
        };
        (scheduler, HalHandle::new(control_tx, snapshot_rx))
    }

    /// Runs both loops until a shutdown signal is received.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let update_interval = self.hal.config().update_interval;
        let broadcast_task = tokio::spawn(broadcast_loop(
            Arc::clone(&self.registry),
            self.snapshot_tx.subscribe(),
            self.hal.config().broadcast_interval,
            shutdown_rx.resubscribe(),
        ));

        let mut interval = tokio::time::interval(update_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!(
            "Update loop running every {:?} ({})",
            update_interval,
            if self.hal.is_hardware() { "hardware" } else { "simulation" }
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    log::info!("Update loop shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Some(status) = self.hal.update(Instant::now()) {
                        self.request_advisory(status);
                    }
                    self.publish();
                }
                Some(msg) = self.control_rx.recv() => self.handle_control(msg),
                Some(text) = self.advisory_rx.recv() => {
                    self.hal.apply_advisory(text);
                    self.publish();
                }
            }
        }

        if let Err(err) = broadcast_task.await {
            log::error!("Broadcast loop failed: {}", err);
        }
    }

    /// Applies a control message and publishes the result before replying, so a caller
    /// that got its reply always reads the new state.
    fn handle_control(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::Command { command, resp } => {
                self.hal.dispatch_command(command);
                self.publish();
                let _ = resp.send(CommandAck {
                    status: "success".to_owned(),
                    command: command.name().to_owned(),
                    drone_state: self.hal.mode(),
                    ai_insight: self.hal.advisory().to_owned(),
                });
            }
            ControlMsg::Scenario { scenario, resp } => {
                self.hal.inject_scenario(scenario);
                self.publish();
                let _ = resp.send(ScenarioAck {
                    status: "success".to_owned(),
                    scenario: scenario.name().to_owned(),
                    drone_state: self.hal.mode(),
                });
            }
            ControlMsg::ManualControl(control) => {
                self.hal.set_manual_control(control);
                self.publish();
            }
        }
    }

    /// Runs the advisor in the background and feeds the result back into the update loop.
    fn request_advisory(&self, status: StatusSummary) {
        log::debug!("Requesting advisory for {:?}", status);
        let generate = self.advisor.generate(status);
        let advisory_tx = self.advisory_tx.clone();
        tokio::spawn(async move {
            let text = generate.await;
            // Fails only once the update loop is gone
            let _ = advisory_tx.send(text);
        });
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.hal.snapshot());
    }
}

async fn broadcast_loop(
    registry: Arc<ConnectionRegistry<TelemetryFrame>>,
    snapshot_rx: watch::Receiver<TelemetrySnapshot>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                log::info!("Broadcast loop shutting down");
                break;
            }
            _ = interval.tick() => {
                if registry.is_empty() {
                    continue;
                }
                let frame = serde_json::to_string(&*snapshot_rx.borrow());
                match frame {
                    Ok(frame) => {
                        registry.broadcast(&TelemetryFrame::from(frame));
                    }
                    Err(err) => log::error!("Failed to serialize telemetry: {}", err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use aigis_advisor::InsightAdvisor;
    use aigis_core::{ManualControl, VehicleMode};
    use aigis_simulator::Simulation;
    use futures::future::BoxFuture;

    use super::*;
    use crate::HalConfig;

    fn config() -> HalConfig {
        HalConfig {
            update_interval: Duration::from_millis(5),
            broadcast_interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn start(
        config: HalConfig,
        advisor: Arc<dyn Advisor>,
    ) -> (
        HalHandle,
        Arc<ConnectionRegistry<TelemetryFrame>>,
        broadcast::Sender<()>,
        tokio::task::JoinHandle<()>,
    ) {
        let simulation = Simulation::with_seed(config.simulation.clone(), 1);
        let hal = Hal::with_simulation(config, simulation);
        let registry = Arc::new(ConnectionRegistry::new());
        let (scheduler, handle) = Scheduler::new(hal, advisor, Arc::clone(&registry));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(scheduler.run(shutdown_rx));
        (handle, registry, shutdown_tx, task)
    }

    /// Counts calls and never finishes within a test's lifetime.
    struct SlowAdvisor {
        calls: Arc<AtomicUsize>,
    }

    impl Advisor for SlowAdvisor {
        fn generate(&self, _status: StatusSummary) -> BoxFuture<'static, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "GEMINI: TOO LATE".to_owned()
            })
        }
    }

    #[tokio::test]
    async fn test_commands_round_trip() {
        let (handle, _registry, shutdown_tx, task) =
            start(config(), Arc::new(InsightAdvisor::local()));

        let ack = handle.dispatch_command("TakeOff").await;
        assert!(ack.accepted());
        assert_eq!(ack.command, "takeoff");
        assert_eq!(ack.drone_state, VehicleMode::Flying);
        assert_eq!(ack.ai_insight, "INITIATING ENGINE START. ASCENT TO 120M.");

        let ack = handle.dispatch_command("barrel_roll").await;
        assert!(!ack.accepted());
        assert_eq!(ack.drone_state, VehicleMode::Flying);

        let ack = handle.inject_scenario("emergency").await;
        assert!(ack.accepted());
        assert_eq!(ack.drone_state, VehicleMode::Emergency);
        // Emergency drain may already have run a few ticks
        let battery = handle.telemetry().status.battery;
        assert!(battery <= 15.0 && battery > 14.0);

        let ack = handle.inject_scenario("volcano").await;
        assert_eq!(ack.status, "ignored");
        assert_eq!(handle.telemetry().status.state, VehicleMode::Emergency);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_local_advisory_reaches_snapshot() {
        let (handle, _registry, shutdown_tx, task) =
            start(config(), Arc::new(InsightAdvisor::local()));
        handle.dispatch_command("scan").await;

        let mut rx = handle.subscribe();
        let found = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if rx.borrow_and_update().status.ai_insight == aigis_advisor::LOCAL_HEURISTICS {
                    break;
                }
                rx.changed().await.unwrap();
            }
        })
        .await;
        assert!(found.is_ok());

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_advisor_is_not_called_twice_within_cooldown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let advisor = Arc::new(SlowAdvisor {
            calls: Arc::clone(&calls),
        });
        let (handle, _registry, shutdown_tx, task) = start(config(), advisor);

        handle.dispatch_command("takeoff").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Telemetry keeps flowing while the advisory is pending
        let before = handle.telemetry().status.battery;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.telemetry().status.battery < before);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribers_receive_frames() {
        let (handle, registry, shutdown_tx, task) =
            start(config(), Arc::new(InsightAdvisor::local()));
        let (id, mut rx) = registry.subscribe_channel(16);

        handle.set_manual_control(ManualControl::new(0.0, 1.0, 0.0));
        let frame = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let frame = rx.recv().await.unwrap();
                let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
                if json["status"]["state"] == "MANUAL" {
                    break json;
                }
            }
        })
        .await
        .unwrap();
        assert!(frame["position"]["x"].is_number());
        assert_eq!(frame["targets"].as_array().unwrap().len(), 3);

        registry.unsubscribe(id);
        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }
}
