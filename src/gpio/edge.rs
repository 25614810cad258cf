//! Edge modes: which observed line values qualify as events.

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy controlling which readings on a line trigger a script.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// Every reading of 1 triggers
    Rising,
    /// Every reading of 0 triggers
    Falling,
    /// Every reading triggers with the observed value
    #[default]
    Both,
    /// Debounced toggle between 0 and 1
    Switch,
}

impl EdgeMode {
    /// The value written to the kernel's `edge` attribute for this mode.
    ///
    /// `Switch` needs interrupts on both edges; the debouncing happens in
    /// userspace.
    pub fn sysfs_edge(self) -> &'static str {
        match self {
            EdgeMode::Rising => "rising",
            EdgeMode::Falling => "falling",
            EdgeMode::Both | EdgeMode::Switch => "both",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeMode::Rising => "rising",
            EdgeMode::Falling => "falling",
            EdgeMode::Both => "both",
            EdgeMode::Switch => "switch",
        }
    }
}

impl FromStr for EdgeMode {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rising" => Ok(EdgeMode::Rising),
            "falling" => Ok(EdgeMode::Falling),
            "both" => Ok(EdgeMode::Both),
            "switch" => Ok(EdgeMode::Switch),
            other => Err(WatchError::config_error(format!(
                "invalid edge value: {} (expected rising, falling, both or switch)",
                other
            ))),
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
