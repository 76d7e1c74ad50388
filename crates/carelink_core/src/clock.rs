//! Source of "now" for scheduling rules.
//!
//! Activities may not start in the past, so the scheduler needs the current
//! instant. It receives it through this port rather than reading the system
//! clock directly.

use chrono::{Local, NaiveDateTime};

pub trait Clock {
    /// Current zone-less local instant.
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the process local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
