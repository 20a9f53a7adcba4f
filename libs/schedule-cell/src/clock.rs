use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Wall-clock source for "today" cutoffs and default start times. Injected
/// so scenarios like "it is 14:10" are deterministic in tests.
pub trait Clock: Send + Sync {
    /// Current date and time in the doctor's local clock.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant. Test support.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
