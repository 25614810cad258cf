//! # gpio-watch - run scripts on GPIO events
//!
//! A small daemon for Raspberry Pi and other Linux single-board computers
//! that watches GPIO lines through the sysfs interface and runs a script
//! whenever a line changes.
//!
//! ## Features
//!
//! - **Edge modes**: `rising`, `falling`, `both`, and a debounced `switch`
//! - **One script per pin**: `{script_dir}/{pin}` is run as
//!   `{script_dir}/{pin} {pin} {value}`
//! - **Discovery**: with no pins given, every pin with a script is watched
//! - **Library + Binary**: use the watch loop as a crate or run `gpio-watch`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gpio_watch::{gpio::sysfs, ScriptDispatcher, SysfsLines, SystemClock, WatchConfig, Watcher};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WatchConfig::new("/etc/gpio-scripts");
//!     config.validate_script_dir()?;
//!
//!     let pins = config.watch_set()?;
//!     for target in &pins {
//!         sysfs::prepare(&config.gpio_base, target.pin, target.edge)?;
//!     }
//!
//!     let (source, lines) = SysfsLines::open(&config.gpio_base, &pins)?;
//!     let dispatcher = ScriptDispatcher::new(&config.script_dir);
//!     Watcher::new(lines, source, dispatcher, SystemClock::new()).run()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gpio;
pub mod watch;

// Re-export public API
pub use config::{PinSpec, WatchConfig, WatchedPin};
pub use error::{Result, WatchError};
pub use gpio::{EdgeMode, LineSource, LineValue, SysfsLines, WatchedLine};
pub use watch::{
    Clock, Dispatch, DispatchOutcome, ScriptDispatcher, SystemClock, Watcher,
};
