//! Single source of "today".
//!
//! The ledger's day key and the orchestrator's rollover checks read the date
//! through `Clock` so day boundaries can be simulated in tests.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day in the user's local timezone.
    fn today(&self) -> NaiveDate;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall clock resolved in a fixed IANA timezone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    timezone: Tz,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            now: Mutex::new(now),
            timezone,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock();
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_follows_local_timezone() {
        // 03:30 UTC is still the previous evening in New York.
        let instant = Utc.with_ymd_and_hms(2026, 2, 12, 3, 30, 0).unwrap();
        let clock = FixedClock::new(instant, chrono_tz::America::New_York);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 2, 11).unwrap());

        let utc_clock = FixedClock::new(instant, chrono_tz::UTC);
        assert_eq!(utc_clock.today(), NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
    }

    #[test]
    fn advance_crosses_midnight() {
        let instant = Utc.with_ymd_and_hms(2026, 2, 12, 23, 0, 0).unwrap();
        let clock = FixedClock::new(instant, chrono_tz::UTC);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
        assert_eq!(clock.now_millis(), clock.now().timestamp_millis());
    }
}
