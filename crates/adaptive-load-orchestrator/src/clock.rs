//! The time source the orchestrator queries for deadline checks (spec.md
//! §5: "time-source queries" is one of the three permitted suspension
//! points).

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// A source of wallclock time, abstracted so tests can control it without
/// sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wallclock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock tests can advance deterministically, standing in for real sleep
/// and wallclock queries.
pub struct FakeClock {
    current: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Advance the clock by `delta`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by an earlier test panic,
    /// which is desired test-failure behavior.
    pub fn advance(&self, delta: chrono::Duration) {
        #[allow(clippy::unwrap_used, reason = "test-only clock; poisoning means an earlier assertion already failed")]
        let mut current = self.current.lock().unwrap();
        *current += delta;
    }
}

impl Clock for FakeClock {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by an earlier test panic,
    /// which is desired test-failure behavior.
    fn now(&self) -> DateTime<Utc> {
        #[allow(clippy::unwrap_used, reason = "test-only clock; poisoning means an earlier assertion already failed")]
        let current = self.current.lock().unwrap();
        *current
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions favor unwrap over verbose matches")]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_by_delta() {
        let start = Utc::now();
        let clock = FakeClock::new(start);
        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
    }
}
