use std::sync::Mutex;

use docgraph_types::Timestamp;

/// Source of creation and update timestamps.
pub trait Clock: Send + Sync {
    /// A timestamp strictly greater than any this clock returned before.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, forced monotonic.
///
/// If the wall clock stalls or steps backwards, the previous reading plus one
/// microsecond is returned instead.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Timestamp>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Timestamp::now();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = if wall > *last { wall } else { last.next() };
        *last = next;
        next
    }
}

/// Hand-driven clock for tests.
///
/// Each call to [`now`](Clock::now) returns the current reading and then
/// advances it by one microsecond, so successive stamps stay distinct.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to `at`. Moving backwards is ignored.
    pub fn set(&self, at: Timestamp) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if at > *current {
            *current = at;
        }
    }

    pub fn advance_secs(&self, secs: u64) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Timestamp::from_micros(current.micros() + secs * 1_000_000);
    }

    /// The reading the next call to `now` will return.
    pub fn peek(&self) -> Timestamp {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let at = *current;
        *current = at.next();
        at
    }
}
