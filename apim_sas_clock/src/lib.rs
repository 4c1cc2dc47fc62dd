//! Utilities for messing with time
//!
//! Types included allow mocking out clocks and other side-effect-laden
//! time operations.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use
)]
#![forbid(unsafe_code)]

use std::cell::Cell;

use chrono::{DateTime, TimeDelta, Utc};

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock> Clock for &C {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The system clock as provided by `chrono::Utc`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A test clock which maintains the current time as internal state
///
/// The time lives in a [`Cell`] so that a test can hold on to a shared
/// borrow of the clock and move time while another component holds its
/// own borrow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestClock(Cell<DateTime<Utc>>);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

impl TestClock {
    /// Creates a new test clock with the specified time
    #[inline]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self(Cell::new(time))
    }

    /// Updates the clock's current time to `val`
    pub fn set(&self, val: DateTime<Utc>) {
        self.0.set(val);
    }

    /// Moves the clock's current time forward by `inc`
    pub fn advance(&self, inc: TimeDelta) {
        self.0.set(self.0.get() + inc);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_clock_advances_through_shared_borrow() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let clock = TestClock::new(start);
        let borrowed = &clock;

        clock.advance(TimeDelta::seconds(90));

        assert_eq!(borrowed.now(), start + TimeDelta::seconds(90));
    }

    #[test]
    fn test_clock_set_overrides_current_time() {
        let clock = TestClock::default();
        let target = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        clock.set(target);

        assert_eq!(clock.now(), target);
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = Utc::now();
        let observed = System.now();
        let after = Utc::now();

        assert!(before <= observed);
        assert!(observed <= after);
    }
}
