use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Check-ins
// =============================================================================

/// Point-in-time self-report across four load axes, each in [0, 100].
///
/// `sensory_load`, `emotional_intensity` and `physical_fatigue` are high-is-bad.
/// `social_battery` is low-is-bad. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub sensory_load: u8,
    pub social_battery: u8,
    pub emotional_intensity: u8,
    pub physical_fatigue: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Values entered on the check-in sheet, before id and timestamp are stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInDraft {
    pub sensory_load: u8,
    pub social_battery: u8,
    pub emotional_intensity: u8,
    pub physical_fatigue: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Where each slider starts on a fresh sheet.
pub const CHECK_IN_SLIDER_DEFAULT: u8 = 50;

impl Default for CheckInDraft {
    fn default() -> Self {
        Self {
            sensory_load: CHECK_IN_SLIDER_DEFAULT,
            social_battery: CHECK_IN_SLIDER_DEFAULT,
            emotional_intensity: CHECK_IN_SLIDER_DEFAULT,
            physical_fatigue: CHECK_IN_SLIDER_DEFAULT,
            note: None,
        }
    }
}

/// Pick the newest check-in regardless of input order.
pub fn latest_check_in(check_ins: &[CheckIn]) -> Option<&CheckIn> {
    check_ins.iter().max_by_key(|c| c.timestamp)
}

// =============================================================================
// Energy ledger
// =============================================================================

/// The daily spoon budget. One live instance per user, keyed by local day.
///
/// Invariant: `1 <= total` and `remaining <= total`. Enforced by the
/// constructors in `ledger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySpoons {
    pub date: NaiveDate,
    pub total: u32,
    pub remaining: u32,
}

// =============================================================================
// Activities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    /// Spoons consumed, always >= 1.
    pub cost: u32,
    /// Stays available while low on energy (eating, hygiene, meds).
    pub is_critical: bool,
    /// Shown on the dashboard grid rather than in the library.
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// =============================================================================
// Derived status
// =============================================================================

/// Tiered alert state. Ordered by severity so `max` picks the worse one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Green,
    Orange,
    Red,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewState {
    Auth,
    Onboarding,
    Dashboard,
    Regulation,
    History,
    SensoryScan,
    Recovery,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Onboarding => "onboarding",
            Self::Dashboard => "dashboard",
            Self::Regulation => "regulation",
            Self::History => "history",
            Self::SensoryScan => "sensory-scan",
            Self::Recovery => "recovery",
        }
    }

    /// Views that keep rendering while the initial load is still pending.
    pub fn survives_loading(&self) -> bool {
        matches!(self, Self::Recovery | Self::SensoryScan)
    }
}

// =============================================================================
// Identity
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

const FALLBACK_DISPLAY_NAME: &str = "Traveler";

impl UserIdentity {
    /// Name used in the dashboard greeting.
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    /// Single uppercase letter for the avatar bubble.
    pub fn initial(&self) -> String {
        self.greeting_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }
}

// =============================================================================
// Sensory scan
// =============================================================================

/// Outcome of a body scan. `true` means uncomfortable / unmet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensoryScanResult {
    pub id: String,
    pub timestamp: i64,
    pub thirst: bool,
    pub hunger: bool,
    pub noise: bool,
    pub light: bool,
    pub temperature: bool,
}
