//! Error types for tracker operations
//!
//! Errors are classified by how the UI should react:
//! - Retryable: persistence or advice service temporarily unavailable
//! - Rejected input: budget, activity or check-in values out of range
//! - RequiresUserAction: not signed in, bad credentials
//!
//! A stale ledger (stored date != today) is not an error. It is handled by
//! `ledger::daily_rollover` on every read path.

use thiserror::Error;

use crate::types::ViewState;

/// Error types for tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    // Rejected input
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid activity: {0}")]
    InvalidActivity(String),

    #[error("Invalid check-in: {0}")]
    InvalidCheckIn(String),

    #[error("Activity '{0}' is part of the starter set and can only be unpinned")]
    ProtectedActivity(String),

    #[error("Activity '{0}' is not available with the current budget")]
    ActivityUnavailable(String),

    #[error("Cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: ViewState, to: ViewState },

    // Retryable
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Advice service unavailable: {0}")]
    AdviceUnavailable(String),

    // Requires user action
    #[error("Identity error: {0}")]
    Identity(String),

    #[error("No user is signed in")]
    NotSignedIn,
}

impl TrackerError {
    /// Returns true if the same request may succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrackerError::PersistenceUnavailable(_) | TrackerError::AdviceUnavailable(_)
        )
    }

    /// Returns true if the user has to do something (sign in, fix credentials)
    pub fn requires_user_action(&self) -> bool {
        matches!(self, TrackerError::Identity(_) | TrackerError::NotSignedIn)
    }

    /// Short inline message. Never a blocking error screen.
    pub fn inline_message(&self) -> String {
        match self {
            TrackerError::InvalidBudget(reason) => format!("That number doesn't fit: {reason}. Nothing changed."),
            TrackerError::InvalidActivity(reason) => format!("That activity can't be saved: {reason}."),
            TrackerError::InvalidCheckIn(_) => {
                "Each gauge goes from 0 to 100. Nothing was saved.".to_string()
            }
            TrackerError::ProtectedActivity(_) => {
                "Starter activities can be unpinned but not deleted.".to_string()
            }
            TrackerError::ActivityUnavailable(_) => {
                "Not enough spoons for that one right now. That's okay.".to_string()
            }
            TrackerError::InvalidTransition { .. } => "That screen isn't reachable from here.".to_string(),
            TrackerError::PersistenceUnavailable(_) => {
                "Couldn't reach your data. Showing what we last saw.".to_string()
            }
            TrackerError::AdviceUnavailable(_) => "Advice is taking a break.".to_string(),
            TrackerError::Identity(reason) => reason.clone(),
            TrackerError::NotSignedIn => "Please sign in first.".to_string(),
        }
    }
}

impl From<crate::db::DbError> for TrackerError {
    fn from(err: crate::db::DbError) -> Self {
        TrackerError::PersistenceUnavailable(err.to_string())
    }
}

/// Serializable notice shown inline by the front end
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineNotice {
    pub message: String,
    pub kind: NoticeKind,
    pub can_retry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Retryable,
    Rejected,
    RequiresUserAction,
}

impl From<&TrackerError> for InlineNotice {
    fn from(err: &TrackerError) -> Self {
        let kind = if err.requires_user_action() {
            NoticeKind::RequiresUserAction
        } else if err.is_retryable() {
            NoticeKind::Retryable
        } else {
            NoticeKind::Rejected
        };

        InlineNotice {
            message: err.inline_message(),
            kind,
            can_retry: err.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failures_are_retryable() {
        let err = TrackerError::PersistenceUnavailable("disk full".to_string());
        let notice = InlineNotice::from(&err);
        assert_eq!(notice.kind, NoticeKind::Retryable);
        assert!(notice.can_retry);
    }

    #[test]
    fn bad_input_is_rejected_not_retried() {
        let err = TrackerError::InvalidBudget("0".to_string());
        let notice = InlineNotice::from(&err);
        assert_eq!(notice.kind, NoticeKind::Rejected);
        assert!(!notice.can_retry);
    }

    #[test]
    fn budget_message_carries_the_bound_that_was_hit() {
        let err = TrackerError::InvalidBudget("daily total must be between 1 and 20, got 25".to_string());
        let message = err.inline_message();
        assert!(message.contains("between 1 and 20, got 25"));
        assert!(!message.contains("at least one spoon"));
    }

    #[test]
    fn identity_errors_surface_their_reason() {
        let err = TrackerError::Identity("Invalid email or password.".to_string());
        assert!(err.requires_user_action());
        assert_eq!(err.inline_message(), "Invalid email or password.");
    }
}
