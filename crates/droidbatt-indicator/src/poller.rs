//! Periodic polling cycle

use crate::presentation::{BatteryLevelBand, MenuEntry, PresentationSurface};
use droidbatt_bridge::{DeviceBridge, battery_level};
use droidbatt_refdata::ReferenceStorage;
use droidbatt_tracker::BatteryTracker;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::MissedTickBehavior;

/// Status line shown while more than one device is connected
pub const STATUS_TITLE: &str = "Android devices charge level";

/// Drives one polling cycle per refresh interval.
///
/// Each cycle reconciles the tracked device set against the bridge's
/// connected list, samples every device and pushes the result to the
/// presentation surface. All bridge calls are synchronous local process
/// invocations, so cycles never overlap; the reference refresh runs
/// independently and is never awaited here.
pub struct Poller<B: DeviceBridge, S: PresentationSurface> {
    bridge: B,
    tracker: BatteryTracker,
    storage: Arc<ReferenceStorage>,
    surface: S,
}

impl<B: DeviceBridge, S: PresentationSurface> Poller<B, S> {
    pub fn new(bridge: B, tracker: BatteryTracker, storage: Arc<ReferenceStorage>, surface: S) -> Self {
        Self {
            bridge,
            tracker,
            storage,
            surface,
        }
    }

    /// The surface, for frontends that need to read back state
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Run one polling cycle at the given unix timestamp
    pub fn tick(&mut self, now: u64) {
        let devices = match self.bridge.devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!("Device enumeration failed: {e}");
                Vec::new()
            }
        };

        if devices.is_empty() {
            self.surface.on_devices_changed(false);
            self.tracker.reset_all();
            return;
        }

        self.tracker.reconcile(&devices, now);
        self.surface.on_devices_changed(true);

        let mut entries = Vec::with_capacity(devices.len());
        for id in &devices {
            let text = Self::device_line(&self.bridge, &mut self.tracker, &self.storage, id, now);
            let icon = BatteryLevelBand::from_level(self.tracker.level_of(id));
            entries.push(MenuEntry { icon, text });
        }

        let status = if entries.len() == 1 {
            entries[0].text.clone()
        } else {
            STATUS_TITLE.to_string()
        };
        self.surface.on_status_text(status);
        self.surface.on_menu_entries(entries);
    }

    fn device_line(
        bridge: &B,
        tracker: &mut BatteryTracker,
        storage: &ReferenceStorage,
        id: &str,
        now: u64,
    ) -> String {
        match bridge.battery_dump(id) {
            Ok(dump) if !dump.is_empty() => {
                let level = battery_level(&dump);
                tracker.sample(
                    id,
                    level,
                    now,
                    || bridge.model(id).unwrap_or_default(),
                    |model| storage.describe(model),
                )
            }
            Ok(_) => format!("{id}: no info"),
            Err(e) => {
                tracing::warn!("Battery query for {id} failed: {e}");
                format!("{id}: no info")
            }
        }
    }

    /// Poll on a fixed interval until ctrl-c
    pub async fn run(mut self, period: Duration) {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        tracing::info!("Polling connected devices every {period:?}");
        loop {
            tokio::select! {
                _ = timer.tick() => self.tick(unix_now()),
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
