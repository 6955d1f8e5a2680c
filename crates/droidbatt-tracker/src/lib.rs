//! Per-device battery tracking and time-to-full estimation
//!
//! Keeps one record per connected device and turns the raw battery levels
//! observed on each polling cycle into a smoothed time-to-full estimate.
//! An estimate is only replaced when the computed charge speed is positive,
//! so a stalled or discharging device never regresses to a bogus value.

use std::collections::HashMap;

/// Longest gap between estimate recomputations, in seconds
pub const DEFAULT_ESTIMATE_PERIOD: u64 = 60;

const COUNTING_PLACEHOLDER: &str = ", counting time to completion...";

/// Estimation state for one device, keyed by its serial.
///
/// A record is created when the device first shows up in the connected
/// list and reset in place when it disconnects, so a later reconnect
/// starts a fresh estimation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Raw device model string, empty until first resolved
    pub model: String,
    /// Battery level at first observation, -1 = unset
    pub begin_battery_level: i32,
    /// Unix seconds of first observation
    pub begin_timestamp: u64,
    /// Battery level at last estimate update, -1 = unset
    pub prev_battery_level: i32,
    /// Unix seconds of last estimate update
    pub refresh_timestamp: u64,
    /// Cached formatted time-to-completion suffix, empty until computable
    pub last_estimation: String,
}

impl Default for DeviceRecord {
    fn default() -> Self {
        Self {
            model: String::new(),
            begin_battery_level: -1,
            begin_timestamp: 0,
            prev_battery_level: -1,
            refresh_timestamp: 0,
            last_estimation: String::new(),
        }
    }
}

impl DeviceRecord {
    /// Reinitialize to the initial value object
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True iff no field holds a non-initial value
    pub fn is_initial(&self) -> bool {
        *self == Self::default()
    }
}

/// Tracks battery state across polling cycles for all connected devices
pub struct BatteryTracker {
    devices: HashMap<String, DeviceRecord>,
    estimate_period: u64,
}

impl Default for BatteryTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ESTIMATE_PERIOD)
    }
}

impl BatteryTracker {
    /// Create a tracker with the given staleness timeout in seconds
    pub fn new(estimate_period: u64) -> Self {
        Self {
            devices: HashMap::new(),
            estimate_period,
        }
    }

    /// Align the tracked set with the currently connected device ids.
    ///
    /// New ids get a fresh record stamped with `now`; ids that dropped off
    /// the list are reset in place. Ids that remain connected are left
    /// untouched.
    pub fn reconcile(&mut self, connected: &[String], now: u64) {
        for id in connected {
            self.devices.entry(id.clone()).or_insert_with(|| {
                tracing::debug!("Tracking new device {id}");
                DeviceRecord {
                    begin_timestamp: now,
                    refresh_timestamp: now,
                    ..DeviceRecord::default()
                }
            });
        }

        for (id, record) in &mut self.devices {
            if !connected.iter().any(|c| c == id) && !record.is_initial() {
                tracing::debug!("Device {id} disconnected, resetting record");
                record.reset();
            }
        }
    }

    /// Reset every record; used when no devices are connected at all
    pub fn reset_all(&mut self) {
        for record in self.devices.values_mut() {
            record.reset();
        }
    }

    /// Last recorded battery level for a device, -1 if unknown
    pub fn level_of(&self, id: &str) -> i32 {
        self.devices
            .get(id)
            .map_or(-1, |record| record.prev_battery_level)
    }

    /// Tracked record for a device, if any
    pub fn record(&self, id: &str) -> Option<&DeviceRecord> {
        self.devices.get(id)
    }

    /// Feed one battery sample for a device and get its status line.
    ///
    /// `raw_level` is the instantaneous battery level, -1 when unreadable.
    /// `model_of` resolves the raw model string; it is called at most once
    /// per record lifetime, the result is cached. `describe` maps the raw
    /// model to a display name.
    pub fn sample(
        &mut self,
        id: &str,
        raw_level: i32,
        now: u64,
        model_of: impl FnOnce() -> String,
        describe: impl Fn(&str) -> String,
    ) -> String {
        let record = self.devices.entry(id.to_string()).or_default();

        if record.begin_battery_level == -1 {
            record.begin_battery_level = raw_level;
            record.begin_timestamp = now;
        }
        if record.prev_battery_level == -1 {
            record.prev_battery_level = raw_level;
        }

        let progressed = raw_level > record.prev_battery_level;
        let stale = now.saturating_sub(record.refresh_timestamp) > self.estimate_period;
        // now == begin_timestamp would divide by zero; skip this cycle
        if (progressed || stale) && now > record.begin_timestamp {
            let speed = f64::from(raw_level - record.begin_battery_level)
                / (now - record.begin_timestamp) as f64;
            if speed > 0.0 {
                let remaining = f64::from(100 - raw_level) / speed;
                record.last_estimation = format_remaining(remaining);
                record.prev_battery_level = raw_level;
                record.refresh_timestamp = now;
            }
        }

        let message = if raw_level == 100 {
            "fully charged".to_string()
        } else if raw_level == -1 {
            format!("getting info error{}", record.last_estimation)
        } else if record.last_estimation.is_empty() {
            format!("{raw_level}%{COUNTING_PLACEHOLDER}")
        } else {
            format!("{raw_level}%{}", record.last_estimation)
        };

        if record.model.is_empty() {
            record.model = model_of();
        }

        format!("{}: {message}", describe(&record.model))
    }
}

/// Format a remaining-seconds estimate as `", H:MM:SS to completion"`
fn format_remaining(seconds: f64) -> String {
    // floor the whole value first so the seconds component never hits 60
    let total = seconds.floor() as u64;
    format!(
        ", {}:{:02}:{:02} to completion",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
