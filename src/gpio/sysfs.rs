//! One-time line setup through the sysfs GPIO interface.
//!
//! Before a line can be watched it has to be exported, switched to input,
//! and told which edges should raise an interrupt. All of it is plain
//! writes to attribute files under the GPIO root.

use crate::error::{Result, WatchError};
use crate::gpio::edge::EdgeMode;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

fn pin_dir(base: &Path, pin: u32) -> PathBuf {
    base.join(format!("gpio{}", pin))
}

fn write_attr(path: &Path, value: &str) -> Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path).map_err(|e| {
        WatchError::gpio_error(format!("failed to open {}: {}", path.display(), e))
    })?;
    file.write_all(value.as_bytes()).map_err(|e| {
        WatchError::gpio_error(format!(
            "failed to write \"{}\" to {}: {}",
            value,
            path.display(),
            e
        ))
    })
}

/// Export `pin` unless it is already exported.
pub fn export(base: &Path, pin: u32) -> Result<()> {
    if pin_dir(base, pin).is_dir() {
        debug!("pin {}: already exported", pin);
        return Ok(());
    }

    debug!("pin {}: exporting", pin);
    write_attr(&base.join("export"), &pin.to_string())
}

/// Make `pin` an input. Watched lines are never driven.
pub fn set_input(base: &Path, pin: u32) -> Result<()> {
    debug!("pin {}: setting direction to in", pin);
    write_attr(&pin_dir(base, pin).join("direction"), "in")
}

pub fn set_edge(base: &Path, pin: u32, edge: EdgeMode) -> Result<()> {
    debug!("pin {}: setting edge to {}", pin, edge.sysfs_edge());
    write_attr(&pin_dir(base, pin).join("edge"), edge.sysfs_edge())
}

/// Make `pin` ready to be watched: export it, make it an input, and enable
/// interrupts for `edge`.
///
/// Direction is set before the edge since the kernel refuses edge
/// configuration on output lines.
pub fn prepare(base: &Path, pin: u32, edge: EdgeMode) -> Result<()> {
    export(base, pin)?;
    set_input(base, pin)?;
    set_edge(base, pin, edge)
}
