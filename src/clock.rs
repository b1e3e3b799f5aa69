use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Source of wall-clock timestamps for the session manager
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for replaying a session timeline.
///
/// Clones share the same instant, so a test can keep one handle and
/// advance the clock the manager is reading from.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_clones_share_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(t0);
        let handle = clock.clone();

        handle.advance_secs(90);
        assert_eq!(clock.now(), t0 + Duration::seconds(90));

        handle.set(t0);
        assert_eq!(clock.now(), t0);
    }

    #[test]
    fn system_clock_moves_forward() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
