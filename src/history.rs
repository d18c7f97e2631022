//! Chart series for the history view.

use crate::types::CheckIn;

/// Points plotted on the history chart.
pub const HISTORY_WINDOW: usize = 20;

/// Fewer points than this shows "not enough data" instead of a chart.
pub const MIN_HISTORY_POINTS: usize = 2;

/// The last `HISTORY_WINDOW` check-ins, oldest first, or `None` when there are
/// too few to draw a line.
pub fn history_series(check_ins: &[CheckIn]) -> Option<Vec<&CheckIn>> {
    let mut series: Vec<&CheckIn> = check_ins.iter().collect();
    series.sort_by_key(|c| c.timestamp);
    let skip = series.len().saturating_sub(HISTORY_WINDOW);
    let series: Vec<&CheckIn> = series.into_iter().skip(skip).collect();

    if series.len() < MIN_HISTORY_POINTS {
        return None;
    }
    Some(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in(timestamp: i64) -> CheckIn {
        CheckIn {
            id: format!("c{timestamp}"),
            timestamp,
            sensory_load: 50,
            social_battery: 50,
            emotional_intensity: 50,
            physical_fatigue: 50,
            note: None,
        }
    }

    #[test]
    fn test_too_few_points() {
        assert!(history_series(&[]).is_none());
        assert!(history_series(&[check_in(1)]).is_none());
    }

    #[test]
    fn test_last_twenty_oldest_first() {
        // Newest first, the way the subscription delivers them.
        let items: Vec<CheckIn> = (0..30).rev().map(check_in).collect();
        let series = history_series(&items).expect("series");
        assert_eq!(series.len(), HISTORY_WINDOW);
        assert_eq!(series[0].timestamp, 10);
        assert_eq!(series[19].timestamp, 29);
    }
}
