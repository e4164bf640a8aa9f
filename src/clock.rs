//! Injectable clocks.
//!
//! Every time-dependent component (signal TTLs, the cache, freshness checks,
//! the replay engine) reads time through the `Clock` trait instead of calling
//! `Utc::now()` directly. Live trading injects `SystemClock`; replay injects a
//! `SimClock` advanced by tick timestamps, which is what makes replay output
//! reproducible.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time for live trading.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Simulated clock driven by the replay engine.
///
/// Time only moves when `set` or `advance` is called, so two replays of the
/// same tick stream observe identical timestamps everywhere.
#[derive(Debug)]
pub struct SimClock {
    now: Mutex<DateTime<Utc>>,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Shared handle, usable wherever an `Arc<dyn Clock>` is expected.
    pub fn shared(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self::new(start))
    }

    /// Jump to an absolute timestamp. Time never moves backwards; a stale
    /// timestamp leaves the clock unchanged.
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock();
        if to > *now {
            *now = to;
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn sim_clock_advances() {
        let clock = SimClock::new(t0());
        assert_eq!(clock.now(), t0());

        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), t0() + Duration::seconds(30));
    }

    #[test]
    fn sim_clock_set_never_rewinds() {
        let clock = SimClock::new(t0());
        clock.set(t0() + Duration::seconds(10));
        assert_eq!(clock.now(), t0() + Duration::seconds(10));

        // Stale timestamp is ignored
        clock.set(t0() + Duration::seconds(5));
        assert_eq!(clock.now(), t0() + Duration::seconds(10));
    }

    #[test]
    fn sim_clock_shared_handle() {
        let clock = SimClock::shared(t0());
        let as_trait: Arc<dyn Clock> = clock.clone();
        clock.advance(Duration::seconds(1));
        assert_eq!(as_trait.now(), t0() + Duration::seconds(1));
    }
}
