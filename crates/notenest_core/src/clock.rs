//! Time source and note timestamp format.
//!
//! # Responsibility
//! - Provide an injectable clock so store stamping, migration back-fill and
//!   grace deadlines are deterministic under test.
//! - Own the single `MM/DD/YYYY HH:MM` timestamp format.
//!
//! # Invariants
//! - Note timestamps are always local wall-clock time at minute precision.
//! - `format_timestamp` and `parse_timestamp` round-trip for any minute.

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::Mutex;

/// `strftime` pattern for persisted note timestamps.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Capability that samples the current local time.
pub trait Clock: Send + Sync {
    /// Returns the current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock to `value`.
    pub fn set(&self, value: NaiveDateTime) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = value;
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Formats `value` as a persisted note timestamp.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a persisted note timestamp.
///
/// Returns `None` for values not in `MM/DD/YYYY HH:MM` form.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_timestamp, Clock, ManualClock};
    use chrono::{Duration, NaiveDate};

    fn at(hour: u32, minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(hour, minute, 42)
            .unwrap()
    }

    #[test]
    fn format_uses_month_day_year_and_drops_seconds() {
        assert_eq!(format_timestamp(at(9, 5)), "03/07/2024 09:05");
    }

    #[test]
    fn parse_accepts_formatted_values_and_rejects_others() {
        let parsed = parse_timestamp("03/07/2024 09:05").expect("should parse");
        assert_eq!(format_timestamp(parsed), "03/07/2024 09:05");
        assert!(parse_timestamp("2024-03-07 09:05:00").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new(at(9, 0));
        assert_eq!(clock.now(), at(9, 0));
        clock.advance(Duration::minutes(3));
        assert_eq!(clock.now(), at(9, 3));
        clock.set(at(10, 0));
        assert_eq!(clock.now(), at(10, 0));
    }
}
