//! Error handling for the gpio-watch crate.

use std::path::PathBuf;

/// A specialized `Result` type for gpio-watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// The main error type for gpio-watch.
///
/// Everything in here is fatal to the caller that receives it. Per-event
/// problems (a missing script, a script failing, a glitchy read) are logged
/// where they happen and never become a `WatchError`.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A `pin[:edge]` argument could not be parsed
    #[error("invalid pin spec \"{spec}\": {reason}")]
    InvalidPinSpec { spec: String, reason: String },

    /// The script directory is missing or not a directory
    #[error("script directory \"{}\" does not exist", .0.display())]
    ScriptDir(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// GPIO setup or access failed
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// The readiness primitive itself failed
    #[error("poll failed: {0}")]
    Poll(#[from] nix::errno::Errno),

    /// A watched line stopped being pollable
    #[error("pin {pin}: line is no longer valid")]
    LineLost { pin: u32 },
}

impl WatchError {
    /// Create a new pin spec error
    pub fn pin_spec_error(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPinSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new GPIO error
    pub fn gpio_error(msg: impl Into<String>) -> Self {
        Self::Gpio(msg.into())
    }
}
