//! Watched lines and the readiness source the watch loop blocks on.

use crate::config::WatchedPin;
use crate::error::{Result, WatchError};
use crate::gpio::edge::EdgeMode;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logical value of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineValue {
    Low = 0,
    High = 1,
}

impl LineValue {
    /// Parse the content of a sysfs `value` file.
    ///
    /// Only the first byte matters. An empty read or anything other than
    /// `'0'`/`'1'` yields `None`.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        match raw.first() {
            Some(b'0') => Some(LineValue::Low),
            Some(b'1') => Some(LineValue::High),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<LineValue> for u8 {
    fn from(value: LineValue) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for LineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Debounce state for lines in `switch` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchState {
    /// Logical on/off state of the switch
    pub state: LineValue,
    /// Monotonic second of the last accepted transition; `None` until the
    /// first one
    pub last_transition: Option<u64>,
}

impl Default for SwitchState {
    fn default() -> Self {
        Self {
            state: LineValue::Low,
            last_transition: None,
        }
    }
}

/// Per-line state owned by the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedLine {
    pub pin: u32,
    pub edge: EdgeMode,
    /// Last value read from the line
    pub last_value: LineValue,
    pub switch: SwitchState,
}

impl WatchedLine {
    pub fn new(pin: u32, edge: EdgeMode, initial: LineValue) -> Self {
        Self {
            pin,
            edge,
            last_value: initial,
            switch: SwitchState::default(),
        }
    }
}

/// A set of lines that can be waited on together.
///
/// Indices refer to registration order and match the order of the
/// `WatchedLine`s handed to the watcher.
pub trait LineSource {
    /// Block until at least one line signals an edge.
    ///
    /// Returns the indices of the ready lines in registration order. An
    /// error here is fatal to the watch loop.
    fn wait(&mut self) -> Result<Vec<usize>>;

    /// Rewind the line's handle and read its current value.
    ///
    /// `Ok(None)` means the read succeeded but did not contain a value.
    fn read_value(&mut self, index: usize) -> io::Result<Option<LineValue>>;
}

/// Lines backed by `/sys/class/gpio/gpioN/value` files, waited on with
/// `poll(2)` for `POLLPRI`.
#[derive(Debug)]
pub struct SysfsLines {
    pins: Vec<u32>,
    files: Vec<File>,
}

impl SysfsLines {
    /// Open the value file of every pin and read its initial value.
    ///
    /// The initial read also consumes any edge notification that was
    /// pending before the watch started. Lines whose initial value cannot be
    /// parsed start out low.
    pub fn open(base: &Path, pins: &[WatchedPin]) -> Result<(Self, Vec<WatchedLine>)> {
        let mut files = Vec::with_capacity(pins.len());
        let mut lines = Vec::with_capacity(pins.len());

        for target in pins {
            let path = value_path(base, target.pin);
            let mut file = File::open(&path).map_err(|e| {
                WatchError::gpio_error(format!(
                    "pin {}: failed to open {}: {}",
                    target.pin,
                    path.display(),
                    e
                ))
            })?;

            let initial = read_line_value(&mut file)?.unwrap_or(LineValue::Low);
            debug!("pin {}: initial value {}", target.pin, initial);

            files.push(file);
            lines.push(WatchedLine::new(target.pin, target.edge, initial));
        }

        let pins = pins.iter().map(|target| target.pin).collect();
        Ok((Self { pins, files }, lines))
    }
}

impl LineSource for SysfsLines {
    fn wait(&mut self) -> Result<Vec<usize>> {
        let mut fds: Vec<PollFd<'_>> = self
            .files
            .iter()
            .map(|file| PollFd::new(file.as_fd(), PollFlags::POLLPRI))
            .collect();

        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(WatchError::Poll(e)),
            }
        }

        let mut ready = Vec::new();
        for (index, fd) in fds.iter().enumerate() {
            let revents = fd.revents().unwrap_or(PollFlags::empty());
            if revents.contains(PollFlags::POLLNVAL) {
                return Err(WatchError::LineLost {
                    pin: self.pins[index],
                });
            }
            if revents.contains(PollFlags::POLLPRI) {
                ready.push(index);
            }
        }

        Ok(ready)
    }

    fn read_value(&mut self, index: usize) -> io::Result<Option<LineValue>> {
        match self.files.get_mut(index) {
            Some(file) => read_line_value(file),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no line registered at index {}", index),
            )),
        }
    }
}

/// Path of the value file for `pin` under the sysfs GPIO root.
pub fn value_path(base: &Path, pin: u32) -> PathBuf {
    base.join(format!("gpio{}", pin)).join("value")
}

/// Rewind and read a value file.
pub fn read_line_value<R: Read + Seek>(handle: &mut R) -> io::Result<Option<LineValue>> {
    handle.seek(SeekFrom::Start(0))?;
    let mut buf = [0u8; 2];
    let n = handle.read(&mut buf)?;
    Ok(LineValue::parse(&buf[..n]))
}
