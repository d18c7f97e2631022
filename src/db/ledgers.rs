use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};

use super::*;
use crate::types::DailySpoons;

impl TrackerDb {
    // =========================================================================
    // Spoon ledger
    // =========================================================================

    /// The stored ledger for `user_id`, or `None` if never written.
    ///
    /// Values come back as stored; callers normalize and roll over.
    pub fn get_ledger(&self, user_id: &str) -> Result<Option<DailySpoons>, DbError> {
        let row: Option<(String, i64, i64)> = self
            .conn
            .query_row(
                "SELECT date, total, remaining FROM ledgers WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((date, total, remaining)) = row else {
            return Ok(None);
        };

        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| DbError::Malformed(format!("ledger date '{date}': {e}")))?;

        Ok(Some(DailySpoons {
            date,
            total: total.clamp(0, i64::from(u32::MAX)) as u32,
            remaining: remaining.clamp(0, i64::from(u32::MAX)) as u32,
        }))
    }

    /// Overwrite the user's single ledger row.
    pub fn upsert_ledger(&self, user_id: &str, ledger: &DailySpoons) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ledgers (user_id, date, total, remaining, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                date = excluded.date,
                total = excluded.total,
                remaining = excluded.remaining,
                updated_at = excluded.updated_at",
            params![
                user_id,
                ledger.date.format("%Y-%m-%d").to_string(),
                ledger.total,
                ledger.remaining,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // =========================================================================
    // Onboarding flag
    // =========================================================================

    pub fn onboarding_seen(&self, user_id: &str) -> Result<bool, DbError> {
        let seen: Option<bool> = self
            .conn
            .query_row(
                "SELECT seen FROM onboarding WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seen.unwrap_or(false))
    }

    pub fn set_onboarding_seen(&self, user_id: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO onboarding (user_id, seen, updated_at) VALUES (?1, 1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET seen = 1, updated_at = excluded.updated_at",
            params![user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_db;
    use super::*;

    fn ledger(day: u32, total: u32, remaining: u32) -> DailySpoons {
        DailySpoons {
            date: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            total,
            remaining,
        }
    }

    #[test]
    fn test_missing_ledger_is_none() {
        let db = test_db();
        assert_eq!(db.get_ledger("u1").expect("read"), None);
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let db = test_db();
        db.upsert_ledger("u1", &ledger(12, 10, 10)).expect("write");
        db.upsert_ledger("u1", &ledger(12, 10, 6)).expect("write");
        assert_eq!(db.get_ledger("u1").expect("read"), Some(ledger(12, 10, 6)));

        let rows: i32 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM ledgers", [], |row| row.get(0))
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_malformed_date_is_reported() {
        let db = test_db();
        db.conn_ref()
            .execute(
                "INSERT INTO ledgers (user_id, date, total, remaining, updated_at)
                 VALUES ('u1', 'Thu Feb 12 2026', 10, 10, 'now')",
                [],
            )
            .expect("raw insert");
        assert!(matches!(db.get_ledger("u1"), Err(DbError::Malformed(_))));
    }

    #[test]
    fn test_onboarding_flag_defaults_false() {
        let db = test_db();
        assert!(!db.onboarding_seen("u1").expect("read"));
        db.set_onboarding_seen("u1").expect("write");
        db.set_onboarding_seen("u1").expect("write twice");
        assert!(db.onboarding_seen("u1").expect("read"));
        assert!(!db.onboarding_seen("u2").expect("read"));
    }
}
