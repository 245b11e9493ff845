//! Monitor run command

use anyhow::Result;
use moon_core::{
    sim::Scenario, HeartRateSource, MonitorConfig, MonitorStatus, MotionSource, SleepMonitor,
    StopReason,
};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run_command(config: MonitorConfig, scenario: Option<&Path>, json: bool) -> Result<()> {
    let scenario = match scenario {
        Some(path) => Scenario::load(path)?,
        None => {
            log::info!("No scenario given, using the built-in one");
            Scenario::default()
        }
    };

    let motion = MotionSource::new(scenario.attitude_sensor());
    let heart_rate = HeartRateSource::new(scenario.health_store());
    let mut monitor = SleepMonitor::new(config, motion, heart_rate);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Received Ctrl-C, shutting down...");
            ctrl_c_token.cancel();
        }
    });

    let mut status_rx = monitor.subscribe();
    print_status(&status_rx.borrow_and_update(), json);
    let printer = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            print_status(&status, json);
        }
    });

    let outcome = monitor.run(cancel).await?;
    // Closing the status channel ends the printer
    drop(monitor);
    printer.await?;

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        match outcome.reason {
            StopReason::Asleep => println!(
                "Sleep detected after {} rounds; polling stopped.",
                outcome.rounds_completed
            ),
            StopReason::Cancelled => println!(
                "Stopped after {} rounds ({} ticks skipped while a fetch was pending).",
                outcome.rounds_completed, outcome.ticks_skipped
            ),
        }
    }
    Ok(())
}

fn print_status(status: &MonitorStatus, json: bool) {
    if json {
        match serde_json::to_string(status) {
            Ok(line) => println!("{line}"),
            Err(e) => log::error!("Failed to encode status: {e}"),
        }
    } else {
        println!("{status}\n");
    }
}
