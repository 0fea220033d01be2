use std::{sync::Arc, time::Duration};

use aigis_advisor::InsightAdvisor;
use aigis_hal::{ConnectionRegistry, Hal, Scheduler};
use anyhow::{Context, Result};
use tokio::sync::broadcast;

use crate::cli::MainArgs;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Starts the HAL, its loops and the web server, and runs until ctrl-c.
pub async fn serve(args: MainArgs) -> Result<()> {
    let advisor =
        InsightAdvisor::new(args.advisor_config()).context("Failed to set up the advisor")?;

    let mut hal = Hal::new(args.hal_config());
    if let Some(link) = args.link_config() {
        hal.connect(link).await;
    }
    log::info!(
        "Telemetry source: {}",
        if hal.is_hardware() { "hardware link" } else { "simulation" }
    );

    let registry = Arc::new(ConnectionRegistry::new());
    let (scheduler, handle) = Scheduler::new(hal, Arc::new(advisor), Arc::clone(&registry));

    let (stop_tx, stop_rx) = broadcast::channel(1);
    let scheduler_task = tokio::spawn(scheduler.run(stop_rx.resubscribe()));
    let mut ui_task = tokio::spawn(aigis_webui::start(
        args.ui_config(),
        handle,
        registry,
        stop_rx,
    ));

    let ui_result = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for ctrl-c")?;
            log::info!("Shutting down (timeout {:?})...", SHUTDOWN_TIMEOUT);
            None
        }
        res = &mut ui_task => Some(res),
    };

    // Either way the loops must stop
    let _ = stop_tx.send(());
    let shutdown = async {
        let ui_result = match ui_result {
            Some(res) => res,
            None => ui_task.await,
        };
        if let Err(err) = scheduler_task.await {
            log::error!("Scheduler task failed: {}", err);
        }
        ui_result
    };
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, shutdown).await {
        Ok(ui_result) => ui_result.context("Web server task panicked")?,
        Err(_) => {
            log::error!("Shutdown timed out");
            Ok(())
        }
    }
}
