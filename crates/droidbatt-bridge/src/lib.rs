//! Android debug bridge wrapper for droidbatt
//!
//! Shells out to the `adb` binary to enumerate attached devices and read
//! per-device properties. All calls are synchronous process invocations;
//! parsing of adb's text output lives in pure helpers so it can be tested
//! without a device attached.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("adb binary not found in PATH")]
    AdbNotFound,

    #[error("adb command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only view of attached devices.
///
/// Abstracted as a trait so the poll loop can be exercised against a fake
/// bridge in tests.
pub trait DeviceBridge {
    /// Serials of devices currently in the `device` state, in adb's order.
    fn devices(&self) -> Result<Vec<String>, BridgeError>;

    /// Product model string of a device.
    fn model(&self, id: &str) -> Result<String, BridgeError>;

    /// Battery service state as a key/value map.
    fn battery_dump(&self, id: &str) -> Result<HashMap<String, String>, BridgeError>;
}

/// Wrapper around the `adb` command-line tool
pub struct AdbBridge {
    adb_path: PathBuf,
}

impl AdbBridge {
    /// Locate the `adb` binary on PATH
    pub fn new() -> Result<Self, BridgeError> {
        let adb_path = which::which("adb").map_err(|_| BridgeError::AdbNotFound)?;
        tracing::debug!("Using adb at {}", adb_path.display());
        Ok(Self { adb_path })
    }

    /// Start the adb server daemon if it is not already running
    pub fn start_server(&self) -> Result<(), BridgeError> {
        let status = Command::new(&self.adb_path).arg("start-server").status()?;
        if !status.success() {
            return Err(BridgeError::CommandFailed(format!(
                "adb start-server exited with {status}"
            )));
        }
        tracing::info!("adb server running");
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<String, BridgeError> {
        let output = Command::new(&self.adb_path).args(args).output()?;
        if !output.status.success() {
            return Err(BridgeError::CommandFailed(format!(
                "adb {} exited with {}",
                args.join(" "),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DeviceBridge for AdbBridge {
    fn devices(&self) -> Result<Vec<String>, BridgeError> {
        let out = self.run(&["devices"])?;
        let devices = parse_device_list(&out);
        tracing::debug!("Found {} connected devices", devices.len());
        Ok(devices)
    }

    fn model(&self, id: &str) -> Result<String, BridgeError> {
        let out = self.run(&["-s", id, "shell", "getprop", "ro.product.model"])?;
        Ok(out.trim().to_string())
    }

    fn battery_dump(&self, id: &str) -> Result<HashMap<String, String>, BridgeError> {
        let out = self.run(&["-s", id, "shell", "dumpsys", "battery"])?;
        Ok(text_to_map(&out))
    }
}

/// Parse `adb devices` output.
///
/// The first line is a header; every following line is `<serial>\t<state>`.
/// Only devices in the `device` state are usable, others (`offline`,
/// `unauthorized`) are skipped.
pub fn parse_device_list(out: &str) -> Vec<String> {
    out.lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let serial = parts.next()?;
            let state = parts.next()?;
            (state == "device").then(|| serial.to_string())
        })
        .collect()
}

/// Parse newline-delimited `key: value` text into a map.
///
/// Keys and values are trimmed; a line without a value maps to an empty
/// string. Text past a second colon on the same line is dropped.
pub fn text_to_map(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.split_once(':') {
                Some((key, value)) => Some((key.trim().to_string(), value.trim().to_string())),
                None => Some((line.to_string(), String::new())),
            }
        })
        .collect()
}

/// Battery level from a dump; an absent or unreadable `level` key means -1
pub fn battery_level(dump: &HashMap<String, String>) -> i32 {
    dump.get("level").and_then(|v| v.parse().ok()).unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_list() {
        let out = "List of devices attached\nABC123\tdevice\nDEF456\toffline\nGHI789\tdevice\n\n";
        assert_eq!(parse_device_list(out), vec!["ABC123", "GHI789"]);
    }

    #[test]
    fn test_parse_device_list_empty() {
        assert!(parse_device_list("List of devices attached\n\n").is_empty());
        assert!(parse_device_list("").is_empty());
    }

    #[test]
    fn test_parse_device_list_unauthorized() {
        let out = "List of devices attached\nABC123\tunauthorized\n";
        assert!(parse_device_list(out).is_empty());
    }

    #[test]
    fn test_text_to_map() {
        let dump = "Current Battery Service state:\n  AC powered: false\n  level: 42\n  scale: 100\n";
        let map = text_to_map(dump);
        assert_eq!(map.get("level").map(String::as_str), Some("42"));
        assert_eq!(map.get("AC powered").map(String::as_str), Some("false"));
        assert_eq!(
            map.get("Current Battery Service state").map(String::as_str),
            Some("")
        );
    }

    #[test]
    fn test_battery_level() {
        let mut dump = HashMap::new();
        assert_eq!(battery_level(&dump), -1);

        dump.insert("level".to_string(), "87".to_string());
        assert_eq!(battery_level(&dump), 87);

        dump.insert("level".to_string(), "unknown".to_string());
        assert_eq!(battery_level(&dump), -1);
    }
}
