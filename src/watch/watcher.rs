//! The watch loop: wait for edges, filter them, run scripts.

use crate::error::{Result, WatchError};
use crate::gpio::{LineSource, WatchedLine};
use crate::watch::debounce::evaluate;
use crate::watch::dispatch::Dispatch;
use nix::errno::Errno;
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Source of monotonic timestamps for debouncing.
pub trait Clock {
    /// Time elapsed since a fixed, arbitrary origin.
    fn now(&self) -> Duration;
}

/// The real monotonic clock, counting from when it was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Owns the watched lines and drives them through the debounce policy and
/// the dispatcher.
///
/// Everything happens on the calling thread. Ready lines are handled in the
/// order the source reports them and each dispatch finishes before the next
/// line is looked at.
pub struct Watcher<S, D, C = SystemClock> {
    lines: Vec<WatchedLine>,
    source: S,
    dispatcher: D,
    clock: C,
}

impl<S: LineSource, D: Dispatch, C: Clock> Watcher<S, D, C> {
    /// `lines[i]` must describe the line the source reports as index `i`.
    pub fn new(lines: Vec<WatchedLine>, source: S, dispatcher: D, clock: C) -> Self {
        Self {
            lines,
            source,
            dispatcher,
            clock,
        }
    }

    pub fn lines(&self) -> &[WatchedLine] {
        &self.lines
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Handle one wake-up of the readiness source.
    ///
    /// Returns how many events were handed to the dispatcher. A failure of
    /// the source's wait, or a line whose device is gone (`ENODEV`), is
    /// returned as an error; other problems with individual lines are logged
    /// and skipped.
    pub fn step(&mut self) -> Result<usize> {
        let ready = self.source.wait()?;
        let mut dispatched = 0;

        for index in ready {
            let Some(line) = self.lines.get_mut(index) else {
                return Err(WatchError::config_error(format!(
                    "line source reported unknown line index {}",
                    index
                )));
            };
            debug!("pin {}: received event", line.pin);

            let value = match self.source.read_value(index) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    debug!("pin {}: unreadable value, skipping event", line.pin);
                    continue;
                }
                // the line was unexported or its device went away
                Err(e) if e.raw_os_error() == Some(Errno::ENODEV as i32) => {
                    return Err(WatchError::LineLost { pin: line.pin });
                }
                Err(e) => {
                    warn!("pin {}: failed to read value: {}", line.pin, e);
                    continue;
                }
            };

            if let Some(event) = evaluate(line, value, self.clock.now()) {
                self.dispatcher.dispatch(line.pin, event);
                dispatched += 1;
            }
        }

        Ok(dispatched)
    }

    /// Watch forever. Returns only when the readiness source fails.
    pub fn run(&mut self) -> Result<Infallible> {
        info!("starting to monitor for gpio events");
        for line in &self.lines {
            info!("pin {}: watching, edge {}", line.pin, line.edge);
        }

        loop {
            self.step()?;
        }
    }
}
