use rusqlite::params;

use super::*;
use crate::types::CheckIn;

impl TrackerDb {
    // =========================================================================
    // Check-ins
    // =========================================================================

    /// Insert a check-in. Existing ids are left untouched (immutable rows).
    pub fn insert_check_in(&self, user_id: &str, check_in: &CheckIn) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO check_ins (user_id, id, timestamp, sensory_load,
                social_battery, emotional_intensity, physical_fatigue, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id,
                check_in.id,
                check_in.timestamp,
                check_in.sensory_load,
                check_in.social_battery,
                check_in.emotional_intensity,
                check_in.physical_fatigue,
                check_in.note,
            ],
        )?;
        Ok(())
    }

    /// Most recent check-ins first, at most `limit`.
    pub fn recent_check_ins(&self, user_id: &str, limit: usize) -> Result<Vec<CheckIn>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, sensory_load, social_battery, emotional_intensity,
                    physical_fatigue, note
             FROM check_ins
             WHERE user_id = ?1
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(CheckIn {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                sensory_load: row.get(2)?,
                social_battery: row.get(3)?,
                emotional_intensity: row.get(4)?,
                physical_fatigue: row.get(5)?,
                note: row.get(6)?,
            })
        })?;

        let mut check_ins = Vec::new();
        for row in rows {
            check_ins.push(row?);
        }
        Ok(check_ins)
    }
}
