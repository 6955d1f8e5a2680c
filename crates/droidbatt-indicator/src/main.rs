//! droidbatt - Android device battery indicator
//!
//! Polls connected Android devices over adb, tracks charge progress and
//! estimates time to full, and resolves raw model codes to marketing
//! names from Google's supported devices list.
//!
//! Startup sequence:
//! 1. Load configuration
//! 2. Locate adb and start its server
//! 3. Bootstrap the device reference table from local storage
//! 4. Kick off a background reference refresh
//! 5. Enter the polling loop

mod poller;
mod presentation;

use anyhow::{Context, Result};
use droidbatt_bridge::AdbBridge;
use droidbatt_config::IndicatorConfig;
use droidbatt_refdata::ReferenceStorage;
use droidbatt_tracker::BatteryTracker;
use poller::Poller;
use presentation::LogSurface;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    info!("droidbatt starting...");

    let config = IndicatorConfig::load_default().context("Failed to load configuration")?;

    let bridge = AdbBridge::new().context("adb is required on PATH")?;
    if let Err(e) = bridge.start_server() {
        warn!("Could not start adb server: {e}");
    }

    let storage = Arc::new(
        ReferenceStorage::new(
            config.feed.url.clone(),
            Duration::from_secs(config.feed.timeout_secs),
            config.storage.cache_file.clone(),
            &config.storage.settings_db,
        )
        .context("Failed to open reference storage")?,
    );
    storage.bootstrap();

    // Refresh the reference table in the background; polling does not
    // wait for it, unresolved models show their raw codes until it lands.
    let refresher = Arc::clone(&storage);
    tokio::spawn(async move {
        if let Err(e) = refresher.load_remote().await {
            warn!("Devices reference update failed: {e}");
        }
    });

    let tracker = BatteryTracker::new(config.estimate_period_secs);
    let poller = Poller::new(bridge, tracker, storage, LogSurface::default());
    poller
        .run(Duration::from_secs(config.refresh_period_secs))
        .await;

    Ok(())
}

/// Setup logging to console
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
