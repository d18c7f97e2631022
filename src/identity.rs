//! Identity collaborator: sign-in, sign-up, sign-out and a current-user feed.
//!
//! `LocalIdentity` keeps profiles in the tracker database. Passwords are
//! stored as salted SHA-256 and never logged.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::db::{DbAccount, TrackerDb};
use crate::error::TrackerError;
use crate::types::UserIdentity;

pub const MIN_PASSWORD_LEN: usize = 6;

const BAD_CREDENTIALS: &str = "Invalid email or password.";
const EMAIL_TAKEN: &str = "An account already exists for this email.";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";
const EMAIL_MISSING: &str = "Please enter a valid email address.";

#[async_trait]
pub trait Identity: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, TrackerError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserIdentity, TrackerError>;

    async fn sign_out(&self) -> Result<(), TrackerError>;

    /// Observable current user. `None` while signed out.
    fn current_user(&self) -> watch::Receiver<Option<UserIdentity>>;
}

pub struct LocalIdentity {
    db: Arc<Mutex<TrackerDb>>,
    current: watch::Sender<Option<UserIdentity>>,
}

impl LocalIdentity {
    pub fn new(db: Arc<Mutex<TrackerDb>>) -> Self {
        let (current, _) = watch::channel(None);
        Self { db, current }
    }

    fn publish(&self, user: Option<UserIdentity>) {
        self.current.send_replace(user);
    }
}

fn normalize_email(email: &str) -> Result<String, TrackerError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(TrackerError::Identity(EMAIL_MISSING.to_string()));
    }
    Ok(email)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn to_identity(account: &DbAccount) -> UserIdentity {
    UserIdentity {
        uid: account.uid.clone(),
        display_name: account.display_name.clone(),
    }
}

#[async_trait]
impl Identity for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, TrackerError> {
        let email = normalize_email(email)?;
        let account = self.db.lock().get_account_by_email(&email)?;

        let Some(account) = account else {
            log::info!("Sign-in rejected: unknown account");
            return Err(TrackerError::Identity(BAD_CREDENTIALS.to_string()));
        };
        if hash_password(&account.password_salt, password) != account.password_hash {
            log::info!("Sign-in rejected for {}", account.uid);
            return Err(TrackerError::Identity(BAD_CREDENTIALS.to_string()));
        }

        let user = to_identity(&account);
        log::info!("Signed in {}", user.uid);
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserIdentity, TrackerError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(TrackerError::Identity(PASSWORD_TOO_SHORT.to_string()));
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let account = DbAccount {
            uid: uuid::Uuid::new_v4().to_string(),
            email,
            display_name: display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            password_hash: hash_password(&salt, password),
            password_salt: salt,
            created_at: Utc::now().to_rfc3339(),
        };

        {
            let db = self.db.lock();
            if db.get_account_by_email(&account.email)?.is_some() {
                return Err(TrackerError::Identity(EMAIL_TAKEN.to_string()));
            }
            db.insert_account(&account)?;
        }

        let user = to_identity(&account);
        log::info!("Created account {}", user.uid);
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), TrackerError> {
        if let Some(user) = self.current.borrow().as_ref() {
            log::info!("Signed out {}", user.uid);
        }
        self.publish(None);
        Ok(())
    }

    fn current_user(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> LocalIdentity {
        LocalIdentity::new(Arc::new(Mutex::new(crate::db::test_db())))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_with_any_email_case() {
        let auth = identity();
        let created = auth
            .sign_up("Sam@Example.com ", "hunter22", Some("Sam"))
            .await
            .expect("sign up");
        auth.sign_out().await.expect("sign out");

        let back = auth.sign_in("sam@example.com", "hunter22").await.expect("sign in");
        assert_eq!(back, created);
        assert_eq!(back.display_name.as_deref(), Some("Sam"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_read_the_same() {
        let auth = identity();
        auth.sign_up("sam@example.com", "hunter22", None).await.expect("sign up");

        let wrong = auth.sign_in("sam@example.com", "hunter23").await.expect_err("wrong");
        let unknown = auth.sign_in("kim@example.com", "hunter22").await.expect_err("unknown");
        assert_eq!(wrong.inline_message(), unknown.inline_message());
        assert!(wrong.requires_user_action());
    }

    #[tokio::test]
    async fn sign_up_rules() {
        let auth = identity();
        let short = auth.sign_up("a@b.c", "12345", None).await.expect_err("short");
        assert_eq!(short.inline_message(), PASSWORD_TOO_SHORT);

        auth.sign_up("a@b.c", "123456", None).await.expect("sign up");
        let taken = auth.sign_up("A@B.C", "abcdef", None).await.expect_err("taken");
        assert_eq!(taken.inline_message(), EMAIL_TAKEN);

        assert!(auth.sign_up("   ", "123456", None).await.is_err());
    }

    #[tokio::test]
    async fn current_user_follows_session() {
        let auth = identity();
        let mut rx = auth.current_user();
        assert!(rx.borrow().is_none());

        let user = auth.sign_up("sam@example.com", "hunter22", Some("  ")).await.expect("sign up");
        rx.changed().await.expect("changed");
        assert_eq!(rx.borrow().as_ref(), Some(&user));
        assert_eq!(user.display_name, None);

        auth.sign_out().await.expect("sign out");
        rx.changed().await.expect("changed");
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn hash_depends_on_salt() {
        assert_ne!(hash_password("a", "pw"), hash_password("b", "pw"));
        assert_eq!(hash_password("a", "pw").len(), 64);
    }
}
