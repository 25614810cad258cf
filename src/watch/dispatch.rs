//! Running the event script for a pin.
//!
//! Scripts are run synchronously: the caller is blocked until the script
//! exits. A slow or hung script therefore stalls every other line, and no
//! timeout is applied.

use crate::config::script_path;
use crate::gpio::LineValue;
use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::{debug, info, warn};

/// Exit status reported when the script could not be started at all.
pub const EXEC_FAILED_STATUS: i32 = 255;

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// There is no script for the pin
    Missing,
    /// The script exited with status 0
    Success,
    /// The script exited with a nonzero status
    Exited(i32),
    /// The script was killed by a signal
    Signaled(i32),
}

impl DispatchOutcome {
    /// Classify the exit status of a finished script.
    pub fn from_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(0), _) => DispatchOutcome::Success,
            (Some(code), _) => DispatchOutcome::Exited(code),
            (None, Some(signal)) => DispatchOutcome::Signaled(signal),
            // neither exited nor signaled; only possible for stopped children
            (None, None) => DispatchOutcome::Exited(EXEC_FAILED_STATUS),
        }
    }

    pub fn is_success(self) -> bool {
        self == DispatchOutcome::Success
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Missing => f.write_str("script does not exist"),
            DispatchOutcome::Success => f.write_str("script succeeded"),
            DispatchOutcome::Exited(code) => {
                write!(f, "event script exited with status = {}", code)
            }
            DispatchOutcome::Signaled(signal) => {
                write!(f, "event script exited due to signal {}", signal)
            }
        }
    }
}

/// Something that reacts to a qualifying event on a pin.
///
/// Implementations must not fail the caller; problems are reported through
/// the returned outcome and the log.
pub trait Dispatch {
    fn dispatch(&mut self, pin: u32, value: LineValue) -> DispatchOutcome;
}

/// Runs `{script_dir}/{pin} {pin} {value}` and waits for it.
#[derive(Debug, Clone)]
pub struct ScriptDispatcher {
    script_dir: PathBuf,
}

impl ScriptDispatcher {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
        }
    }
}

impl Dispatch for ScriptDispatcher {
    fn dispatch(&mut self, pin: u32, value: LineValue) -> DispatchOutcome {
        let path = script_path(&self.script_dir, pin);

        if !path.is_file() {
            warn!("pin {}: script \"{}\" does not exist", pin, path.display());
            return DispatchOutcome::Missing;
        }

        info!("pin {}: running script {}", pin, path.display());

        // stdout and stderr are inherited, so script output lands wherever
        // the daemon's own output goes
        let outcome = match Command::new(&path)
            .arg(pin.to_string())
            .arg(value.to_string())
            .status()
        {
            Ok(status) => DispatchOutcome::from_status(status),
            Err(e) => {
                debug!("pin {}: failed to execute {}: {}", pin, path.display(), e);
                DispatchOutcome::Exited(EXEC_FAILED_STATUS)
            }
        };

        if !outcome.is_success() {
            warn!("pin {}: {}", pin, outcome);
        }

        outcome
    }
}
