//! Watch configuration and watch-set construction.

use crate::error::{Result, WatchError};
use crate::gpio::{EdgeMode, DEFAULT_GPIO_BASE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Default directory holding the event scripts.
pub const DEFAULT_SCRIPT_DIR: &str = "/etc/gpio-scripts";

/// Pins `0..DISCOVERY_PIN_LIMIT` are scanned for scripts when no pins are
/// given explicitly.
pub const DISCOVERY_PIN_LIMIT: u32 = 32;

/// A `pin[:edge]` argument as given on the command line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinSpec {
    pub pin: u32,
    /// Falls back to the configured default edge when absent
    pub edge: Option<EdgeMode>,
}

impl FromStr for PinSpec {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        let (pin, edge) = match s.split_once(':') {
            Some((pin, edge)) => (pin, Some(edge)),
            None => (s, None),
        };

        let pin = pin
            .parse::<u32>()
            .map_err(|_| WatchError::pin_spec_error(s, format!("\"{}\" is not a pin number", pin)))?;

        let edge = match edge {
            Some(edge) => Some(
                edge.parse::<EdgeMode>()
                    .map_err(|_| WatchError::pin_spec_error(s, format!("unknown edge \"{}\"", edge)))?,
            ),
            None => None,
        };

        Ok(Self { pin, edge })
    }
}

impl fmt::Display for PinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.edge {
            Some(edge) => write!(f, "{}:{}", self.pin, edge),
            None => write!(f, "{}", self.pin),
        }
    }
}

/// A pin in the resolved watch set, with its effective edge mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedPin {
    pub pin: u32,
    pub edge: EdgeMode,
}

impl WatchedPin {
    pub fn new(pin: u32, edge: EdgeMode) -> Self {
        Self { pin, edge }
    }
}

/// Configuration for the watcher daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    /// Directory holding one script per pin, named after the pin number
    pub script_dir: PathBuf,
    /// Edge mode for pins given without one
    pub default_edge: EdgeMode,
    /// Root of the sysfs GPIO interface
    pub gpio_base: PathBuf,
    /// Append log output (and script output) to this file
    pub log_file: Option<PathBuf>,
    /// Detach from the controlling terminal
    pub detach: bool,
    /// Number of `-v` flags given
    pub verbosity: u8,
    /// Pins given explicitly; empty means discover from the script directory
    pub pins: Vec<PinSpec>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            default_edge: EdgeMode::default(),
            gpio_base: PathBuf::from(DEFAULT_GPIO_BASE),
            log_file: None,
            detach: false,
            verbosity: 0,
            pins: Vec::new(),
        }
    }
}

impl WatchConfig {
    /// Create a new configuration watching scripts in `script_dir`.
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_default_edge(mut self, edge: EdgeMode) -> Self {
        self.default_edge = edge;
        self
    }

    pub fn with_gpio_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.gpio_base = base.into();
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    pub fn with_detach(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_pins(mut self, pins: Vec<PinSpec>) -> Self {
        self.pins = pins;
        self
    }

    /// Path of the script that handles events on `pin`.
    pub fn script_path(&self, pin: u32) -> PathBuf {
        script_path(&self.script_dir, pin)
    }

    /// Fail unless the script directory exists.
    pub fn validate_script_dir(&self) -> Result<()> {
        if self.script_dir.is_dir() {
            Ok(())
        } else {
            Err(WatchError::ScriptDir(self.script_dir.clone()))
        }
    }

    /// Resolve the set of pins to watch.
    ///
    /// Explicit pins keep their order and get the default edge filled in. A
    /// pin listed twice is an error. Without explicit pins, every pin below
    /// [`DISCOVERY_PIN_LIMIT`] that has a script gets watched with the
    /// default edge.
    pub fn watch_set(&self) -> Result<Vec<WatchedPin>> {
        if self.pins.is_empty() {
            return Ok(self.discover_pins());
        }

        let mut seen = HashSet::new();
        let mut watched = Vec::with_capacity(self.pins.len());
        for spec in &self.pins {
            if !seen.insert(spec.pin) {
                return Err(WatchError::config_error(format!(
                    "pin {} is listed more than once",
                    spec.pin
                )));
            }
            watched.push(WatchedPin::new(
                spec.pin,
                spec.edge.unwrap_or(self.default_edge),
            ));
        }

        Ok(watched)
    }

    fn discover_pins(&self) -> Vec<WatchedPin> {
        (0..DISCOVERY_PIN_LIMIT)
            .filter(|&pin| {
                let found = self.script_path(pin).is_file();
                if found {
                    debug!("pin {}: found script, watching", pin);
                }
                found
            })
            .map(|pin| WatchedPin::new(pin, self.default_edge))
            .collect()
    }
}

/// `{script_dir}/{pin}`, no extension.
pub fn script_path(script_dir: &Path, pin: u32) -> PathBuf {
    script_dir.join(pin.to_string())
}
