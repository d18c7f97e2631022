//! Activity catalog: the starter set, user-created entries, pinning and
//! availability gating against the current ledger.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;
use crate::ledger::is_low_energy;
use crate::types::{Activity, DailySpoons};

/// Cost used when the create form leaves it blank.
pub const DEFAULT_ACTIVITY_COST: u32 = 1;

/// Upper bound the create form puts on a custom cost.
pub const MAX_CUSTOM_ACTIVITY_COST: u32 = 10;

/// Icon key for user-created entries.
pub const CUSTOM_ICON: &str = "custom";

/// (id, name, cost, is_critical, is_pinned, icon). Ids are stable across
/// users and seeding passes.
const DEFAULT_ACTIVITIES: [(&str, &str, u32, bool, bool, &str); 9] = [
    ("shower", "Shower", 1, true, true, "shower"),
    ("meal", "Cook / eat", 1, true, true, "food"),
    ("work", "Work (1h)", 3, false, true, "work"),
    ("social", "Social outing", 4, false, true, "coffee"),
    ("call", "Phone call", 2, false, false, "phone"),
    ("chores", "Housework", 3, false, false, "cart"),
    ("transit", "Transit", 2, false, false, "bus"),
    ("admin", "Bills / admin", 2, false, false, "file"),
    ("package", "Pick up a parcel", 1, false, false, "package"),
];

pub fn default_catalog() -> Vec<Activity> {
    DEFAULT_ACTIVITIES
        .iter()
        .map(|&(id, name, cost, is_critical, is_pinned, icon)| Activity {
            id: id.to_string(),
            name: name.to_string(),
            cost,
            is_critical,
            is_pinned,
            icon: Some(icon.to_string()),
        })
        .collect()
}

/// True for ids that belong to the starter set.
pub fn is_default_activity(id: &str) -> bool {
    DEFAULT_ACTIVITIES.iter().any(|(default_id, ..)| *default_id == id)
}

/// Entries to write when the catalog is empty; nothing otherwise.
pub fn seed_if_empty(catalog: &[Activity]) -> Vec<Activity> {
    if catalog.is_empty() {
        default_catalog()
    } else {
        Vec::new()
    }
}

/// Build a user-created activity. Always pinned, always the custom icon.
pub fn create(name: &str, cost: Option<u32>, is_critical: bool) -> Result<Activity, TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::InvalidActivity("name is empty".to_string()));
    }
    let cost = cost.unwrap_or(DEFAULT_ACTIVITY_COST);
    if cost == 0 {
        return Err(TrackerError::InvalidBudget(
            "activity cost must be at least 1".to_string(),
        ));
    }
    Ok(Activity {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        cost,
        is_critical,
        is_pinned: true,
        icon: Some(CUSTOM_ICON.to_string()),
    })
}

pub fn toggle_pin(activity: &Activity) -> Activity {
    Activity {
        is_pinned: !activity.is_pinned,
        ..activity.clone()
    }
}

/// Starter entries can only be unpinned.
pub fn ensure_deletable(id: &str) -> Result<(), TrackerError> {
    if is_default_activity(id) {
        return Err(TrackerError::ProtectedActivity(id.to_string()));
    }
    Ok(())
}

/// Pinned entries in catalog order.
pub fn dashboard_view(catalog: &[Activity]) -> Vec<&Activity> {
    catalog.iter().filter(|a| a.is_pinned).collect()
}

/// Unpinned entries in catalog order ("suggestions").
pub fn library_view(catalog: &[Activity]) -> Vec<&Activity> {
    catalog.iter().filter(|a| !a.is_pinned).collect()
}

pub fn find<'a>(catalog: &'a [Activity], id: &str) -> Option<&'a Activity> {
    catalog.iter().find(|a| a.id == id)
}

/// Why an activity button is enabled or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    /// Low-energy mode blocks a non-critical activity (shows the lock).
    Locked,
    /// Fewer spoons left than the activity costs.
    Unaffordable,
}

pub fn availability(activity: &Activity, ledger: &DailySpoons) -> Availability {
    if is_low_energy(ledger) && !activity.is_critical {
        Availability::Locked
    } else if ledger.remaining < activity.cost {
        Availability::Unaffordable
    } else {
        Availability::Available
    }
}

pub fn is_available(activity: &Activity, ledger: &DailySpoons) -> bool {
    availability(activity, ledger) == Availability::Available
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn ledger(total: u32, remaining: u32) -> DailySpoons {
        DailySpoons {
            date: NaiveDate::from_ymd_opt(2026, 2, 12).unwrap(),
            total,
            remaining,
        }
    }

    fn activity(id: &str, cost: u32, is_critical: bool) -> Activity {
        Activity {
            id: id.to_string(),
            name: id.to_string(),
            cost,
            is_critical,
            is_pinned: true,
            icon: None,
        }
    }

    #[test]
    fn starter_set_has_nine_stable_entries() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 9);
        let ids: HashSet<_> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), 9);
        assert_eq!(default_catalog(), catalog);
        assert_eq!(dashboard_view(&catalog).len(), 4);
        assert_eq!(library_view(&catalog).len(), 5);
        assert!(catalog.iter().all(|a| a.cost >= 1));
    }

    #[test]
    fn seeding_only_when_empty() {
        assert_eq!(seed_if_empty(&[]).len(), 9);
        assert!(seed_if_empty(&[activity("x", 1, false)]).is_empty());
    }

    #[test]
    fn create_pins_and_trims() {
        let a = create("  Gardening ", None, false).unwrap();
        assert_eq!(a.name, "Gardening");
        assert_eq!(a.cost, DEFAULT_ACTIVITY_COST);
        assert!(a.is_pinned);
        assert_eq!(a.icon.as_deref(), Some(CUSTOM_ICON));
        assert!(!is_default_activity(&a.id));

        let b = create("Gardening", Some(2), true).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn create_rejects_blank_name_and_zero_cost() {
        assert!(matches!(create("   ", Some(1), false), Err(TrackerError::InvalidActivity(_))));
        assert!(matches!(create("Walk", Some(0), false), Err(TrackerError::InvalidBudget(_))));
    }

    #[test]
    fn toggling_twice_restores_pin() {
        let a = create("Walk", Some(2), false).unwrap();
        let once = toggle_pin(&a);
        assert!(!once.is_pinned);
        assert_eq!(toggle_pin(&once), a);
    }

    #[test]
    fn starter_entries_are_protected() {
        assert!(matches!(ensure_deletable("shower"), Err(TrackerError::ProtectedActivity(_))));
        assert!(ensure_deletable("3f1c-custom").is_ok());
    }

    #[test]
    fn dashboard_keeps_catalog_order() {
        let mut unpinned = activity("b", 1, false);
        unpinned.is_pinned = false;
        let catalog = vec![activity("c", 1, false), unpinned, activity("a", 1, false)];
        let ids: Vec<_> = dashboard_view(&catalog).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn low_energy_locks_non_critical() {
        let heavy = activity("work", 3, false);
        assert!(!is_available(&heavy, &ledger(10, 2)));
        assert_eq!(availability(&heavy, &ledger(10, 2)), Availability::Locked);
    }

    #[test]
    fn critical_survives_low_energy_when_affordable() {
        let meal = activity("meal", 1, true);
        assert!(is_available(&meal, &ledger(10, 2)));
        assert!(is_available(&meal, &ledger(10, 1)));
        assert_eq!(availability(&meal, &ledger(10, 0)), Availability::Unaffordable);
    }

    #[test]
    fn cost_gate_applies_with_plenty_of_energy() {
        let social = activity("social", 4, false);
        assert_eq!(availability(&social, &ledger(10, 3)), Availability::Unaffordable);
        assert!(is_available(&social, &ledger(10, 4)));
    }
}
