//! Event monitoring and dispatch.
//!
//! This module is the heart of the daemon: the loop that blocks on all
//! watched lines at once, the per-line debounce policy, and the script
//! dispatcher that turns qualifying events into script runs.

pub mod debounce;
pub mod dispatch;
pub mod watcher;

// Re-export commonly used items
pub use debounce::{evaluate, SWITCH_DEBOUNCE_SECS};
pub use dispatch::{Dispatch, DispatchOutcome, ScriptDispatcher, EXEC_FAILED_STATUS};
pub use watcher::{Clock, SystemClock, Watcher};
