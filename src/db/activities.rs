use rusqlite::params;

use super::*;
use crate::types::Activity;

impl TrackerDb {
    // =========================================================================
    // Activity catalog
    // =========================================================================

    /// All activities for `user_id` in insertion order.
    pub fn list_activities(&self, user_id: &str) -> Result<Vec<Activity>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, cost, is_critical, is_pinned, icon
             FROM activities
             WHERE user_id = ?1
             ORDER BY seq",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Activity {
                id: row.get(0)?,
                name: row.get(1)?,
                cost: row.get(2)?,
                is_critical: row.get(3)?,
                is_pinned: row.get(4)?,
                icon: row.get(5)?,
            })
        })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    /// Insert or update by id. Updates keep the original catalog position.
    pub fn upsert_activity(&self, user_id: &str, activity: &Activity) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO activities (user_id, id, name, cost, is_critical, is_pinned, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, id) DO UPDATE SET
                name = excluded.name,
                cost = excluded.cost,
                is_critical = excluded.is_critical,
                is_pinned = excluded.is_pinned,
                icon = excluded.icon",
            params![
                user_id,
                activity.id,
                activity.name,
                activity.cost,
                activity.is_critical,
                activity.is_pinned,
                activity.icon,
            ],
        )?;
        Ok(())
    }

    /// Returns true if a row was removed.
    pub fn delete_activity(&self, user_id: &str, activity_id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM activities WHERE user_id = ?1 AND id = ?2",
            params![user_id, activity_id],
        )?;
        Ok(changed > 0)
    }
}
