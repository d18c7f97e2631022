//! Tiered alert derivation from the spoon ledger and the latest check-in.
//!
//! `derive_status` is the only place status is computed. It is pure and is
//! re-run on every data change; nothing caches it.
//!
//! Thresholds are compared in integer arithmetic so boundary values land
//! exactly where the fractions say they do:
//! - spoon ratio <= 0.2 is `remaining * 5 <= total`
//! - weighted load = (1.5*sensory + emotional + physical + social_load) / 4.5,
//!   i.e. (3*sensory + 2*(emotional + physical + social_load)) / 9

use serde::{Deserialize, Serialize};

use crate::types::{AppStatus, CheckIn, DailySpoons};

/// Weighted load above which the check-in alone is red (scaled by 9).
const RED_LOAD_SCALED: u32 = 70 * 9;
/// Weighted load above which the check-in alone is orange (scaled by 9).
const ORANGE_LOAD_SCALED: u32 = 40 * 9;
/// A single sensory spike escalates regardless of the blended average.
const RED_SENSORY_SPIKE: u8 = 85;
const ORANGE_SENSORY_SPIKE: u8 = 60;

pub fn derive_status(ledger: &DailySpoons, latest: Option<&CheckIn>) -> AppStatus {
    let check_in_status = latest.map(check_in_status).unwrap_or(AppStatus::Green);
    spoon_status(ledger).max(check_in_status)
}

/// Status from the remaining/total ratio alone.
pub fn spoon_status(ledger: &DailySpoons) -> AppStatus {
    let remaining = u64::from(ledger.remaining);
    let total = u64::from(ledger.total.max(1));
    if remaining * 5 <= total {
        AppStatus::Red
    } else if remaining * 5 <= total * 2 {
        AppStatus::Orange
    } else {
        AppStatus::Green
    }
}

/// Status from a single check-in alone.
pub fn check_in_status(check_in: &CheckIn) -> AppStatus {
    let scaled = scaled_load(check_in);
    if scaled > RED_LOAD_SCALED || check_in.sensory_load > RED_SENSORY_SPIKE {
        AppStatus::Red
    } else if scaled > ORANGE_LOAD_SCALED || check_in.sensory_load > ORANGE_SENSORY_SPIKE {
        AppStatus::Orange
    } else {
        AppStatus::Green
    }
}

/// Social battery flipped so every axis reads high = bad.
pub fn social_load(check_in: &CheckIn) -> u8 {
    100u8.saturating_sub(check_in.social_battery)
}

/// Weighted average load in [0, 100], for display.
pub fn average_load(check_in: &CheckIn) -> f64 {
    f64::from(scaled_load(check_in)) / 9.0
}

fn scaled_load(check_in: &CheckIn) -> u32 {
    3 * u32::from(check_in.sensory_load)
        + 2 * (u32::from(check_in.emotional_intensity)
            + u32::from(check_in.physical_fatigue)
            + u32::from(social_load(check_in)))
}

// =============================================================================
// Gauge tones
// =============================================================================

/// Which end of an axis is the bad one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HighIsBad,
    LowIsBad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisTone {
    Calm,
    Elevated,
    Alert,
}

pub fn axis_tone(value: u8, polarity: Polarity) -> AxisTone {
    match polarity {
        Polarity::HighIsBad if value > 80 => AxisTone::Alert,
        Polarity::HighIsBad if value > 50 => AxisTone::Elevated,
        Polarity::LowIsBad if value < 20 => AxisTone::Alert,
        Polarity::LowIsBad if value < 50 => AxisTone::Elevated,
        _ => AxisTone::Calm,
    }
}

/// Tone per axis in form order: sensory, social, emotional, physical.
pub fn check_in_tones(check_in: &CheckIn) -> [(&'static str, AxisTone); 4] {
    [
        ("sensory", axis_tone(check_in.sensory_load, Polarity::HighIsBad)),
        ("social", axis_tone(check_in.social_battery, Polarity::LowIsBad)),
        ("emotional", axis_tone(check_in.emotional_intensity, Polarity::HighIsBad)),
        ("physical", axis_tone(check_in.physical_fatigue, Polarity::HighIsBad)),
    ]
}
