//! Presentation callback surface
//!
//! The indicator core never renders anything itself; it reports what to
//! show through [`PresentationSurface`]. A panel/tray frontend implements
//! the trait; the shipped default just logs.

/// Battery level band selecting a menu icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevelBand {
    FullCharged,
    Full,
    Good,
    Low,
    Caution,
    Empty,
    Missing,
}

impl BatteryLevelBand {
    /// Band for a raw battery level; -1 (unreadable) maps to `Missing`
    pub fn from_level(level: i32) -> Self {
        if level == 100 {
            BatteryLevelBand::FullCharged
        } else if level > 90 {
            BatteryLevelBand::Full
        } else if level > 20 {
            BatteryLevelBand::Good
        } else if level > 14 {
            BatteryLevelBand::Low
        } else if level > 0 {
            BatteryLevelBand::Caution
        } else if level == 0 {
            BatteryLevelBand::Empty
        } else {
            BatteryLevelBand::Missing
        }
    }

    /// Symbolic icon name for themed icon sets
    pub fn icon_name(&self) -> &'static str {
        match self {
            BatteryLevelBand::FullCharged => "battery-full-charged-symbolic",
            BatteryLevelBand::Full => "battery-full-charging-symbolic",
            BatteryLevelBand::Good => "battery-good-charging-symbolic",
            BatteryLevelBand::Low => "battery-low-charging-symbolic",
            BatteryLevelBand::Caution => "battery-caution-charging-symbolic",
            BatteryLevelBand::Empty => "battery-empty-symbolic",
            BatteryLevelBand::Missing => "battery-missing-symbolic",
        }
    }
}

/// One row of the indicator's dropdown menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub icon: BatteryLevelBand,
    pub text: String,
}

/// Callbacks toward the display layer
pub trait PresentationSurface {
    /// Indicator visibility follows whether any device is connected
    fn on_devices_changed(&mut self, visible: bool);

    /// Tooltip/status line
    fn on_status_text(&mut self, text: String);

    /// Full menu contents, one entry per connected device
    fn on_menu_entries(&mut self, entries: Vec<MenuEntry>);
}

/// Default surface that reports through the log
#[derive(Debug, Default)]
pub struct LogSurface {
    visible: bool,
}

impl PresentationSurface for LogSurface {
    fn on_devices_changed(&mut self, visible: bool) {
        if visible != self.visible {
            self.visible = visible;
            if visible {
                tracing::info!("Devices connected, indicator shown");
            } else {
                tracing::info!("No devices connected, indicator hidden");
            }
        }
    }

    fn on_status_text(&mut self, text: String) {
        tracing::info!("Status: {text}");
    }

    fn on_menu_entries(&mut self, entries: Vec<MenuEntry>) {
        for entry in entries {
            tracing::debug!("[{}] {}", entry.icon.icon_name(), entry.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_mapping() {
        assert_eq!(BatteryLevelBand::from_level(100), BatteryLevelBand::FullCharged);
        assert_eq!(BatteryLevelBand::from_level(95), BatteryLevelBand::Full);
        assert_eq!(BatteryLevelBand::from_level(91), BatteryLevelBand::Full);
        assert_eq!(BatteryLevelBand::from_level(90), BatteryLevelBand::Good);
        assert_eq!(BatteryLevelBand::from_level(21), BatteryLevelBand::Good);
        assert_eq!(BatteryLevelBand::from_level(20), BatteryLevelBand::Low);
        assert_eq!(BatteryLevelBand::from_level(15), BatteryLevelBand::Low);
        assert_eq!(BatteryLevelBand::from_level(14), BatteryLevelBand::Caution);
        assert_eq!(BatteryLevelBand::from_level(1), BatteryLevelBand::Caution);
        assert_eq!(BatteryLevelBand::from_level(0), BatteryLevelBand::Empty);
        assert_eq!(BatteryLevelBand::from_level(-1), BatteryLevelBand::Missing);
    }
}
