//! Daily spoon budget arithmetic.
//!
//! All functions take the current ledger by reference and return the next one.
//! Nothing here touches persistence; callers write the result back.

use chrono::NaiveDate;

use crate::error::TrackerError;
use crate::types::DailySpoons;

/// Budget used when a user has never stored one.
pub const DEFAULT_DAILY_TOTAL: u32 = 10;

/// At or below this many spoons, non-critical activities lock.
pub const LOW_ENERGY_THRESHOLD: u32 = 2;

/// Bounds the catalog UI puts on the daily total. The ledger itself only
/// rejects zero.
pub const MIN_DAILY_TOTAL: u32 = 1;
pub const MAX_DAILY_TOTAL: u32 = 20;

/// A full ledger for `date`.
pub fn fresh(date: NaiveDate, total: u32) -> Result<DailySpoons, TrackerError> {
    if total == 0 {
        return Err(TrackerError::InvalidBudget(
            "daily total must be at least 1".to_string(),
        ));
    }
    Ok(DailySpoons {
        date,
        total,
        remaining: total,
    })
}

/// Repair a ledger read from storage so the invariants hold.
///
/// A zero total is treated as absent and replaced with the default; an
/// over-full `remaining` is clamped to `total`.
pub fn normalize(ledger: DailySpoons) -> DailySpoons {
    let total = if ledger.total == 0 {
        DEFAULT_DAILY_TOTAL
    } else {
        ledger.total
    };
    DailySpoons {
        date: ledger.date,
        total,
        remaining: ledger.remaining.min(total),
    }
}

/// Spend `cost` spoons. Floors at zero rather than rejecting.
pub fn spend(ledger: &DailySpoons, cost: u32) -> DailySpoons {
    DailySpoons {
        remaining: ledger.remaining.saturating_sub(cost),
        ..*ledger
    }
}

pub fn reset_to_full(ledger: &DailySpoons) -> DailySpoons {
    DailySpoons {
        remaining: ledger.total,
        ..*ledger
    }
}

/// Change the daily total. Raising it never refills; lowering it clamps.
pub fn set_total(ledger: &DailySpoons, new_total: u32) -> Result<DailySpoons, TrackerError> {
    if new_total == 0 {
        return Err(TrackerError::InvalidBudget(format!(
            "daily total must be positive, got {new_total}"
        )));
    }
    Ok(DailySpoons {
        total: new_total,
        remaining: ledger.remaining.min(new_total),
        ..*ledger
    })
}

pub fn is_low_energy(ledger: &DailySpoons) -> bool {
    ledger.remaining <= LOW_ENERGY_THRESHOLD
}

/// Start a new day if `ledger` belongs to an earlier (or later) date.
///
/// The total carries over; remaining refills.
pub fn daily_rollover(ledger: &DailySpoons, today: NaiveDate) -> DailySpoons {
    if ledger.date == today {
        return *ledger;
    }
    let total = if ledger.total == 0 {
        DEFAULT_DAILY_TOTAL
    } else {
        ledger.total
    };
    DailySpoons {
        date: today,
        total,
        remaining: total,
    }
}

/// True when the stored ledger no longer matches `today`.
pub fn is_stale(ledger: &DailySpoons, today: NaiveDate) -> bool {
    ledger.date != today
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn ledger(total: u32, remaining: u32) -> DailySpoons {
        DailySpoons {
            date: day(12),
            total,
            remaining,
        }
    }

    #[test]
    fn spend_floors_at_zero() {
        for total in 1..=12u32 {
            for remaining in 0..=total {
                for cost in 0..=15u32 {
                    let after = spend(&ledger(total, remaining), cost);
                    assert_eq!(after.remaining, remaining.saturating_sub(cost));
                    assert!(after.remaining <= after.total);
                    assert_eq!(after.total, total);
                }
            }
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let start = ledger(10, 3);
        let once = reset_to_full(&start);
        assert_eq!(once.remaining, 10);
        assert_eq!(reset_to_full(&once), once);
    }

    #[test]
    fn raising_total_does_not_refill() {
        let after = set_total(&ledger(10, 4), 15).unwrap();
        assert_eq!(after.total, 15);
        assert_eq!(after.remaining, 4);
    }

    #[test]
    fn lowering_total_clamps_remaining() {
        for new_total in 1..=20u32 {
            let after = set_total(&ledger(10, 8), new_total).unwrap();
            assert!(after.remaining <= new_total);
        }
        assert_eq!(set_total(&ledger(10, 8), 5).unwrap().remaining, 5);
    }

    #[test]
    fn zero_total_is_rejected() {
        let start = ledger(10, 8);
        assert!(matches!(
            set_total(&start, 0),
            Err(TrackerError::InvalidBudget(_))
        ));
        assert!(matches!(fresh(day(1), 0), Err(TrackerError::InvalidBudget(_))));
    }

    #[test]
    fn low_energy_is_absolute() {
        assert!(is_low_energy(&ledger(10, 2)));
        assert!(is_low_energy(&ledger(3, 0)));
        assert!(!is_low_energy(&ledger(20, 3)));
        // Same ratio, different answer: threshold is not a ratio.
        assert!(!is_low_energy(&ledger(100, 20)));
    }

    #[test]
    fn rollover_same_day_is_noop() {
        let start = ledger(10, 1);
        assert_eq!(daily_rollover(&start, day(12)), start);
        assert!(!is_stale(&start, day(12)));
    }

    #[test]
    fn rollover_new_day_refills_and_keeps_total() {
        let start = ledger(14, 1);
        let next = daily_rollover(&start, day(13));
        assert_eq!(next.date, day(13));
        assert_eq!(next.total, 14);
        assert_eq!(next.remaining, 14);
    }

    #[test]
    fn rollover_defaults_missing_total() {
        let broken = DailySpoons { date: day(1), total: 0, remaining: 0 };
        let next = daily_rollover(&broken, day(12));
        assert_eq!(next.total, DEFAULT_DAILY_TOTAL);
        assert_eq!(next.remaining, DEFAULT_DAILY_TOTAL);
    }

    #[test]
    fn normalize_repairs_stored_values() {
        let stored = DailySpoons { date: day(12), total: 5, remaining: 9 };
        assert_eq!(normalize(stored).remaining, 5);
        let empty = DailySpoons { date: day(12), total: 0, remaining: 3 };
        assert_eq!(normalize(empty).total, DEFAULT_DAILY_TOTAL);
        assert_eq!(normalize(empty).remaining, 3);
    }
}
