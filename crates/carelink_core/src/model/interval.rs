//! Interval algebra shared by care windows and activities.
//!
//! # Responsibility
//! - Decide validity, overlap and containment for closed-open ranges.
//! - Project weekly time-of-day ranges onto a concrete calendar date.
//!
//! # Invariants
//! - `overlaps(a, b) == overlaps(b, a)` for every pair, including full
//!   containment in either direction and zero-length ranges.
//! - `overlaps(a, a)` is always true.
//! - Functions are pure; "now" is passed in by the caller.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Range bounded by `start` and `end`.
///
/// Used with `NaiveDateTime` for dated activities and `NaiveTime` for the
/// weekly care window projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

/// Interval between two absolute (zone-less) instants.
pub type AbsoluteInterval = Interval<NaiveDateTime>;

/// Interval between two times of day, date-independent.
pub type TimeOfDayInterval = Interval<NaiveTime>;

impl<T: Ord> Interval<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// Returns whether `start <= end`.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// Returns whether an absolute interval can be scheduled at `now`.
///
/// Holds iff the interval is ordered, both ends lie on the same calendar day
/// and `start` is not earlier than `now`.
pub fn is_valid_absolute(interval: &AbsoluteInterval, now: NaiveDateTime) -> bool {
    interval.is_ordered()
        && interval.start.date() == interval.end.date()
        && interval.start >= now
}

/// Returns whether two intervals share at least one instant.
///
/// Evaluates the one-sided test in both argument orders, so the result never
/// depends on which side a call site passes first.
pub fn overlaps<T: Ord>(a: &Interval<T>, b: &Interval<T>) -> bool {
    overlaps_one_sided(a, b) || overlaps_one_sided(b, a)
}

fn overlaps_one_sided<T: Ord>(a: &Interval<T>, b: &Interval<T>) -> bool {
    let start_inside = a.start >= b.start && a.start < b.end;
    let end_inside = a.end > b.start && a.end <= b.end;
    let covers = a.start <= b.start && a.end >= b.end;
    start_inside || end_inside || covers
}

/// Returns whether `inner` lies entirely within `outer` (bounds inclusive).
pub fn contains<T: Ord>(outer: &Interval<T>, inner: &Interval<T>) -> bool {
    inner.start >= outer.start && inner.end <= outer.end
}

/// Places a time-of-day range on the calendar date of `absolute.start`.
pub fn align_time_of_day(
    absolute: &AbsoluteInterval,
    time_of_day: &TimeOfDayInterval,
) -> AbsoluteInterval {
    let date = absolute.start.date();
    Interval::new(date.and_time(time_of_day.start), date.and_time(time_of_day.end))
}
