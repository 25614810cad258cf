//! Decides whether a reading on a line is an event worth dispatching.

use crate::gpio::{EdgeMode, LineValue, WatchedLine};
use std::time::Duration;

/// Whole monotonic seconds that must separate two accepted transitions in
/// `switch` mode. A transition is accepted only when the difference is
/// strictly greater, so the real gap is always more than one second.
pub const SWITCH_DEBOUNCE_SECS: u64 = 1;

/// Run a fresh reading through the line's edge policy.
///
/// `now` is monotonic time since an arbitrary origin; only its whole seconds
/// are used. Returns the value to hand to the script, or `None` if the
/// reading does not qualify. Only `switch` mode keeps state and debounces;
/// the other modes fire on every matching reading.
// TODO: rising/falling/both still fire on every bounce of a mechanical
// switch; consider applying the switch debounce to them behind an option.
pub fn evaluate(line: &mut WatchedLine, value: LineValue, now: Duration) -> Option<LineValue> {
    line.last_value = value;

    match line.edge {
        EdgeMode::Rising => (value == LineValue::High).then_some(LineValue::High),
        EdgeMode::Falling => (value == LineValue::Low).then_some(LineValue::Low),
        EdgeMode::Both => Some(value),
        EdgeMode::Switch => {
            let switch = &mut line.switch;
            if switch.state == value {
                return None;
            }

            let now = now.as_secs();
            let eligible = match switch.last_transition {
                Some(at) => now.saturating_sub(at) > SWITCH_DEBOUNCE_SECS,
                None => true,
            };
            if !eligible {
                return None;
            }

            switch.state = value;
            switch.last_transition = Some(now);
            Some(value)
        }
    }
}
