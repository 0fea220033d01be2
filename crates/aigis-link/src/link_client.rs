use std::time::Duration;

use aigis_core::Command;
use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, watch};

use crate::{
    messages::{LinkCommand, LinkMessage},
    transport::{LinkTarget, Transport},
    LinkTelemetry, VehicleLink,
};

/// Altitude requested on takeoff, in m
const TAKEOFF_ALTITUDE: f64 = 10.0;

#[derive(Debug, Clone)]
/// Configuration for the vehicle link.
pub struct LinkConfig {
    /// Connection string, `tcp:<host>:<port>` or `udp:<host>:<port>`
    pub target: String,
    /// How long to wait for the transport and the first heartbeat
    pub heartbeat_timeout: Duration,
    /// Pause after a receive error before trying again
    pub retry_backoff: Duration,
}

impl LinkConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            heartbeat_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Opens the link and waits for the first heartbeat. On success a background task keeps
/// decoding incoming messages into the shared telemetry record until the returned handle
/// is dropped.
pub async fn connect(config: LinkConfig) -> Result<LinkHandle> {
    let target: LinkTarget = config.target.parse()?;
    log::info!("Connecting to vehicle on {}...", target);

    let mut telemetry = LinkTelemetry::default();
    let transport = tokio::time::timeout(config.heartbeat_timeout, async {
        let mut transport = Transport::open(&target).await?;
        wait_heartbeat(&mut transport, &mut telemetry).await?;
        Ok::<_, anyhow::Error>(transport)
    })
    .await
    .map_err(|_| anyhow!("No heartbeat from {} within {:?}", target, config.heartbeat_timeout))??;
    log::info!("Link established with vehicle on {} (mode {})", target, telemetry.mode_name);

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (telemetry_tx, telemetry_rx) = watch::channel(telemetry);
    let client = LinkClient {
        target,
        transport,
        cmd_rx,
        telemetry_tx,
        retry_backoff: config.retry_backoff,
    };
    tokio::spawn(client.run());

    Ok(LinkHandle {
        cmd_tx,
        telemetry_rx,
    })
}

async fn wait_heartbeat(transport: &mut Transport, telemetry: &mut LinkTelemetry) -> Result<()> {
    loop {
        match transport.recv().await {
            Ok(msg) => {
                let is_heartbeat = matches!(msg, LinkMessage::Heartbeat { .. });
                telemetry.apply(&msg);
                if is_heartbeat {
                    return Ok(());
                }
            }
            Err(err) if transport.is_closed() => return Err(err),
            Err(err) => log::debug!("Ignoring undecodable message while waiting for heartbeat: {err}"),
        }
    }
}

/// Background decode loop.
struct LinkClient {
    target: LinkTarget,
    transport: Transport,
    cmd_rx: mpsc::UnboundedReceiver<LinkCommand>,
    telemetry_tx: watch::Sender<LinkTelemetry>,
    retry_backoff: Duration,
}

impl LinkClient {
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if let Err(err) = self.transport.send(&cmd).await {
                            log::error!("Failed to send {:?} to vehicle: {}", cmd, err);
                        }
                    }
                    None => {
                        log::info!("Shutting down vehicle link");
                        break;
                    }
                },
                msg = self.transport.recv() => match msg {
                    Ok(msg) => {
                        self.telemetry_tx.send_modify(|telemetry| telemetry.apply(&msg));
                    }
                    Err(err) => {
                        log::error!("Link decoder error: {:#}", err);
                        tokio::time::sleep(self.retry_backoff).await;
                        if self.transport.is_closed() {
                            self.reopen().await;
                        }
                    }
                }
            }
        }
    }

    async fn reopen(&mut self) {
        match Transport::open(&self.target)
            .await
            .context("Failed to reopen vehicle link")
        {
            Ok(transport) => {
                log::info!("Vehicle link on {} reopened", self.target);
                self.transport = transport;
            }
            Err(err) => log::warn!("{:#}", err),
        }
    }
}

/// Maps an operator command onto the link's command vocabulary. Commands the vehicle
/// has no equivalent for return `None`.
pub fn link_commands(command: Command) -> Option<Vec<LinkCommand>> {
    match command {
        Command::Takeoff => Some(vec![
            LinkCommand::Arm,
            LinkCommand::Takeoff {
                altitude: TAKEOFF_ALTITUDE,
            },
        ]),
        Command::Land => Some(vec![LinkCommand::SetMode {
            mode: "LAND".to_owned(),
        }]),
        Command::Rtl => Some(vec![LinkCommand::SetMode {
            mode: "RTL".to_owned(),
        }]),
        Command::Scan | Command::Mission | Command::Emergency => None,
    }
}

/// Handle to a connected vehicle.
#[derive(Debug)]
pub struct LinkHandle {
    cmd_tx: mpsc::UnboundedSender<LinkCommand>,
    telemetry_rx: watch::Receiver<LinkTelemetry>,
}

impl VehicleLink for LinkHandle {
    fn current_telemetry(&self) -> LinkTelemetry {
        self.telemetry_rx.borrow().clone()
    }

    fn send_command(&self, command: Command) -> bool {
        let Some(cmds) = link_commands(command) else {
            return false;
        };
        cmds.into_iter().all(|cmd| {
            self.cmd_tx
                .send(cmd)
                .map_err(|err| log::error!("Error sending link command: {:?}", err))
                .is_ok()
        })
    }
}
