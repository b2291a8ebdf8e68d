//! Calendar clock capability.

use chrono::{Local, NaiveDate};

/// Source of "today" for due-date comparisons.
///
/// Status derivation compares calendar dates only, so the clock hands out a
/// `NaiveDate` and never a timestamp.
pub trait Clock: Send + Sync {
    fn current_date(&self) -> NaiveDate;
}

/// Wall clock in the server's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date (tests, replays).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn current_date(&self) -> NaiveDate {
        self.0
    }
}
