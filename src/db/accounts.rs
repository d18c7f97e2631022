use rusqlite::{params, OptionalExtension};

use super::*;

impl TrackerDb {
    // =========================================================================
    // Local profiles
    // =========================================================================

    pub fn insert_account(&self, account: &DbAccount) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO accounts (uid, email, display_name, password_salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.uid,
                account.email,
                account.display_name,
                account.password_salt,
                account.password_hash,
                account.created_at,
            ],
        )?;
        Ok(())
    }

    /// Look up by already-normalized (lowercased, trimmed) email.
    pub fn get_account_by_email(&self, email: &str) -> Result<Option<DbAccount>, DbError> {
        let account = self
            .conn
            .query_row(
                "SELECT uid, email, display_name, password_salt, password_hash, created_at
                 FROM accounts WHERE email = ?1",
                params![email],
                |row| {
                    Ok(DbAccount {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                        display_name: row.get(2)?,
                        password_salt: row.get(3)?,
                        password_hash: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_db;
    use super::*;

    fn account(uid: &str, email: &str) -> DbAccount {
        DbAccount {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: Some("Sam".to_string()),
            password_salt: "salt".to_string(),
            password_hash: "hash".to_string(),
            created_at: "2026-02-12T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_round_trip_by_email() {
        let db = test_db();
        db.insert_account(&account("u1", "sam@example.com")).expect("insert");
        let found = db.get_account_by_email("sam@example.com").expect("query");
        assert_eq!(found, Some(account("u1", "sam@example.com")));
        assert_eq!(db.get_account_by_email("nobody@example.com").expect("query"), None);
    }

    #[test]
    fn test_email_is_unique() {
        let db = test_db();
        db.insert_account(&account("u1", "sam@example.com")).expect("insert");
        assert!(db.insert_account(&account("u2", "sam@example.com")).is_err());
    }
}
