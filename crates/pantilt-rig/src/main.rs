//! PanTilt rig binary.
//!
//! Replays a recorded session against the servo and trigger boards.

use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pantilt_core::ControlLoop;
use pantilt_rig::{
    open_serial, ActuatorLink, DiskScreenshotSink, LandmarkEstimator, LogDisplay, ReplaySource,
    RigConfig, TriggerLink,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pantilt_core=info,pantilt_rig=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting pantilt-rig");

    let config = RigConfig::from_env();
    info!("Rig config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("pantilt-rig failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: RigConfig) -> anyhow::Result<()> {
    config.validate()?;

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics listening on {}", addr);
    }

    let replay_path = config
        .replay_path
        .as_deref()
        .context("PANTILT_REPLAY_PATH is not set")?;
    let source = ReplaySource::open(replay_path, config.replay_fps, config.replay_loop)?;
    let screenshots = DiskScreenshotSink::new(&config.screenshot_dir)?;

    let actuator_port = open_serial(&config.actuator_port, config.baud, config.link_timeout)
        .with_context(|| format!("Failed to open actuator port {}", config.actuator_port))?;
    let trigger_port = open_serial(&config.trigger_port, config.baud, config.link_timeout)
        .with_context(|| format!("Failed to open trigger port {}", config.trigger_port))?;

    // Both boards reset when the port opens
    info!(
        warmup_ms = config.link_warmup.as_millis() as u64,
        "Waiting for boards to come up"
    );
    tokio::time::sleep(config.link_warmup).await;

    let control = ControlLoop::new(
        config.control.clone(),
        Box::new(source),
        Box::new(LandmarkEstimator),
        Arc::new(screenshots),
        Box::new(ActuatorLink::new(config.actuator_port.clone(), actuator_port)),
        Box::new(TriggerLink::new(config.trigger_port.clone(), trigger_port)),
    )?
    .with_display(Box::new(LogDisplay::new()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    let summary = control.run(shutdown_rx).await?;
    info!("Run summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}
