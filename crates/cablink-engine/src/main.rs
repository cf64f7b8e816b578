//! Bridge binary for cablink.
//!
//! Wires the controller channel, the shared target store, and a virtual
//! cab together, then raises a `Tick` frame event at a fixed interval
//! until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `cablink.yaml`
//! 3. Build the virtual cab from the configured layout
//! 4. Start the message channel; received messages go to the target store
//! 5. Run the frame loop until Ctrl-C
//! 6. Stop the channel, closing the connection

mod bridge;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cablink_channel::MessageChannel;
use cablink_core::TICK_EVENT;
use cablink_core::config::BridgeConfig;
use cablink_core::inbound::receive_message;
use cablink_core::store::TargetStore;
use cablink_core::virtual_cab::VirtualCab;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::bridge::Bridge;
use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "cablink.yaml";

/// Application entry point for the bridge.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the channel
/// fails to shut down.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("cablink-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        url = %config.channel.url,
        tick_interval_ms = config.tick.interval_ms,
        actuators = config.cab.actuators.len(),
        "Configuration loaded"
    );

    // 3. Build the cab.
    let cab = VirtualCab::from_config(&config.cab);
    info!(seat_side = ?config.cab.seat_side, "Virtual cab ready");

    // 4. Start the channel.
    let store = Arc::new(TargetStore::new());
    let inbound_store = Arc::clone(&store);
    let channel = MessageChannel::start(&config.channel, move |raw: &str| {
        receive_message(&inbound_store, raw);
    });
    let mut bridge = Bridge::new(cab, store, channel.sender());

    // 5. Frame loop.
    run_frames(&mut bridge, config.tick.interval_ms).await?;

    // 6. Shut down.
    channel.stop().await.map_err(EngineError::from)?;
    info!("cablink-engine stopped");
    Ok(())
}

/// Raise a tick frame every `interval_ms` until Ctrl-C.
async fn run_frames<S: cablink_core::MessageSink>(
    bridge: &mut Bridge<S>,
    interval_ms: u64,
) -> Result<(), EngineError> {
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut waiting_for_player = false;
    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.map_err(|source| EngineError::Signal { source })?;
                info!("Shutdown requested");
                return Ok(());
            }
            _ = interval.tick() => {
                let summary = bridge.on_frame(TICK_EVENT);
                if !summary.forwarded.is_empty() {
                    debug!(notifications = summary.forwarded.len(), "Value changes handled");
                }

                let skipped = summary.report.and_then(|report| report.skipped);
                match (skipped, waiting_for_player) {
                    (Some(reason), false) => {
                        warn!(?reason, "Player not in a cab, targets pending");
                        waiting_for_player = true;
                    }
                    (None, true) => {
                        info!("Player in cab, reconciling");
                        waiting_for_player = false;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Load the bridge configuration from `cablink.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<BridgeConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = BridgeConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        let mut config = BridgeConfig::default();
        config.channel.apply_env_overrides();
        Ok(config)
    }
}
