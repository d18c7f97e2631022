//! Live subscriptions owned by the signed-in session, keyed by user id.

use std::collections::HashMap;

use crate::persistence::Subscription;
use crate::types::{Activity, CheckIn, DailySpoons};

/// Which persistence stream an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    CheckIns,
    Ledger,
    Activities,
}

/// The three streams for one user. A slot is `None` if subscribing failed or
/// the stream has closed.
#[derive(Default)]
pub struct UserFeeds {
    pub check_ins: Option<Subscription<Vec<CheckIn>>>,
    pub ledger: Option<Subscription<Option<DailySpoons>>>,
    pub activities: Option<Subscription<Vec<Activity>>>,
}

impl UserFeeds {
    pub fn close(&mut self, feed: Feed) {
        match feed {
            Feed::CheckIns => self.check_ins = None,
            Feed::Ledger => self.ledger = None,
            Feed::Activities => self.activities = None,
        }
    }

    fn cancel_all(self) {
        if let Some(sub) = self.check_ins {
            sub.cancel();
        }
        if let Some(sub) = self.ledger {
            sub.cancel();
        }
        if let Some(sub) = self.activities {
            sub.cancel();
        }
    }
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    active: HashMap<String, UserFeeds>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel everything, then install `feeds` for `user_id`.
    pub fn replace(&mut self, user_id: &str, feeds: UserFeeds) {
        self.teardown_all();
        self.active.insert(user_id.to_string(), feeds);
    }

    /// Cancel every live subscription. Returns how many users were torn down.
    pub fn teardown_all(&mut self) -> usize {
        let count = self.active.len();
        for (user_id, feeds) in self.active.drain() {
            feeds.cancel_all();
            log::debug!("Tore down subscriptions for {}", user_id);
        }
        count
    }

    pub fn feeds_mut(&mut self, user_id: &str) -> Option<&mut UserFeeds> {
        self.active.get_mut(user_id)
    }

    #[cfg(test)]
    pub fn is_active(&self, user_id: &str) -> bool {
        self.active.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
