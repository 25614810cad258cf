//! GPIO line access through the Linux sysfs interface.
//!
//! This module covers everything that touches the hardware: the edge-mode
//! vocabulary, the per-line watch state, the one-time sysfs setup sequence,
//! and the `poll(2)`-based readiness source the watch loop blocks on.

pub mod edge;
pub mod line;
pub mod sysfs;

// Re-export commonly used items
pub use edge::EdgeMode;
pub use line::{LineSource, LineValue, SwitchState, SysfsLines, WatchedLine};

/// Default root of the sysfs GPIO interface.
pub const DEFAULT_GPIO_BASE: &str = "/sys/class/gpio";
