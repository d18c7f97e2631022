//! Persistence collaborator: per-user streams of check-ins, the ledger and the
//! activity catalog, plus fire-and-forget writes.
//!
//! Subscriptions behave like live document queries: the current snapshot is
//! pushed as soon as one subscribes, and every later write re-pushes the
//! affected snapshot to that user's subscribers. Writes never update caller
//! state directly; callers observe their own writes through the stream.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::db::TrackerDb;
use crate::error::TrackerError;
use crate::ledger;
use crate::types::{Activity, CheckIn, DailySpoons};

/// Check-in snapshots carry at most this many entries, newest first.
pub const CHECK_IN_SUBSCRIPTION_LIMIT: usize = 50;

// =============================================================================
// Subscriptions
// =============================================================================

/// Cancels a subscription when called or dropped.
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    #[cfg(test)]
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// A stream of snapshots plus the handle that tears it down.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    handle: SubscriptionHandle,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::UnboundedReceiver<T>, handle: SubscriptionHandle) -> Self {
        Self { rx, handle }
    }

    /// Wait for the next snapshot. `None` once the producer is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next already-delivered snapshot, without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Newest pending snapshot, discarding older ones it supersedes.
    #[cfg(test)]
    pub fn latest(&mut self) -> Option<T> {
        let mut last = None;
        while let Ok(value) = self.rx.try_recv() {
            last = Some(value);
        }
        last
    }

    pub fn cancel(self) {
        self.handle.cancel();
    }
}

// =============================================================================
// Collaborator contract
// =============================================================================

#[async_trait]
pub trait Persistence: Send + Sync {
    fn subscribe_check_ins(&self, user_id: &str) -> Result<Subscription<Vec<CheckIn>>, TrackerError>;

    async fn append_check_in(&self, user_id: &str, check_in: CheckIn) -> Result<(), TrackerError>;

    fn subscribe_ledger(&self, user_id: &str)
        -> Result<Subscription<Option<DailySpoons>>, TrackerError>;

    async fn write_ledger(&self, user_id: &str, ledger: DailySpoons) -> Result<(), TrackerError>;

    fn subscribe_activities(&self, user_id: &str) -> Result<Subscription<Vec<Activity>>, TrackerError>;

    async fn upsert_activity(&self, user_id: &str, activity: Activity) -> Result<(), TrackerError>;

    async fn delete_activity(&self, user_id: &str, activity_id: &str) -> Result<(), TrackerError>;

    async fn onboarding_seen(&self, user_id: &str) -> Result<bool, TrackerError>;

    async fn set_onboarding_seen(&self, user_id: &str) -> Result<(), TrackerError>;
}

// =============================================================================
// Local SQLite store
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    CheckIns,
    Ledger,
    Activities,
}

struct Listeners<T> {
    by_user: HashMap<String, Vec<(u64, mpsc::UnboundedSender<T>)>>,
}

impl<T: Clone> Listeners<T> {
    fn new() -> Self {
        Self {
            by_user: HashMap::new(),
        }
    }

    fn add(&mut self, user_id: &str, id: u64, tx: mpsc::UnboundedSender<T>) {
        self.by_user.entry(user_id.to_string()).or_default().push((id, tx));
    }

    fn remove(&mut self, user_id: &str, id: u64) {
        if let Some(list) = self.by_user.get_mut(user_id) {
            list.retain(|(listener_id, _)| *listener_id != id);
            if list.is_empty() {
                self.by_user.remove(user_id);
            }
        }
    }

    fn count(&self, user_id: &str) -> usize {
        self.by_user.get(user_id).map(Vec::len).unwrap_or(0)
    }

    /// Send to every live listener, pruning closed ones.
    fn publish(&mut self, user_id: &str, value: T) {
        if let Some(list) = self.by_user.get_mut(user_id) {
            list.retain(|(_, tx)| tx.send(value.clone()).is_ok());
            if list.is_empty() {
                self.by_user.remove(user_id);
            }
        }
    }
}

struct Hub {
    next_id: u64,
    check_ins: Listeners<Vec<CheckIn>>,
    ledger: Listeners<Option<DailySpoons>>,
    activities: Listeners<Vec<Activity>>,
}

impl Hub {
    fn new() -> Self {
        Self {
            next_id: 0,
            check_ins: Listeners::new(),
            ledger: Listeners::new(),
            activities: Listeners::new(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove(&mut self, feed: Feed, user_id: &str, id: u64) {
        match feed {
            Feed::CheckIns => self.check_ins.remove(user_id, id),
            Feed::Ledger => self.ledger.remove(user_id, id),
            Feed::Activities => self.activities.remove(user_id, id),
        }
    }
}

/// SQLite-backed persistence with in-process snapshot fan-out.
///
/// Lock order is always hub, then db.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<TrackerDb>>,
    hub: Arc<Mutex<Hub>>,
}

impl LocalStore {
    pub fn new(db: Arc<Mutex<TrackerDb>>) -> Self {
        Self {
            db,
            hub: Arc::new(Mutex::new(Hub::new())),
        }
    }

    pub fn open_at(path: PathBuf) -> Result<Self, TrackerError> {
        let db = TrackerDb::open_at(path)?;
        Ok(Self::new(Arc::new(Mutex::new(db))))
    }

    /// Shared handle for other adapters on the same database.
    pub fn db(&self) -> Arc<Mutex<TrackerDb>> {
        self.db.clone()
    }

    /// Live listeners for `user_id` across all three feeds.
    pub fn subscriber_count(&self, user_id: &str) -> usize {
        let hub = self.hub.lock();
        hub.check_ins.count(user_id) + hub.ledger.count(user_id) + hub.activities.count(user_id)
    }

    fn cancel_handle(&self, feed: Feed, user_id: &str, id: u64) -> SubscriptionHandle {
        let hub: Weak<Mutex<Hub>> = Arc::downgrade(&self.hub);
        let user_id = user_id.to_string();
        SubscriptionHandle::new(move || {
            if let Some(hub) = hub.upgrade() {
                hub.lock().remove(feed, &user_id, id);
                log::debug!("Cancelled {:?} subscription {} for {}", feed, id, user_id);
            }
        })
    }

    fn read_check_ins(db: &TrackerDb, user_id: &str) -> Result<Vec<CheckIn>, TrackerError> {
        Ok(db.recent_check_ins(user_id, CHECK_IN_SUBSCRIPTION_LIMIT)?)
    }

    fn read_ledger(db: &TrackerDb, user_id: &str) -> Result<Option<DailySpoons>, TrackerError> {
        Ok(db.get_ledger(user_id)?.map(ledger::normalize))
    }

    fn read_activities(db: &TrackerDb, user_id: &str) -> Result<Vec<Activity>, TrackerError> {
        Ok(db.list_activities(user_id)?)
    }

    fn publish_check_ins(&self, user_id: &str) {
        let mut hub = self.hub.lock();
        if hub.check_ins.count(user_id) == 0 {
            return;
        }
        match Self::read_check_ins(&self.db.lock(), user_id) {
            Ok(snapshot) => hub.check_ins.publish(user_id, snapshot),
            Err(e) => log::warn!("Check-in snapshot for {} failed: {}", user_id, e),
        }
    }

    fn publish_ledger(&self, user_id: &str) {
        let mut hub = self.hub.lock();
        if hub.ledger.count(user_id) == 0 {
            return;
        }
        match Self::read_ledger(&self.db.lock(), user_id) {
            Ok(snapshot) => hub.ledger.publish(user_id, snapshot),
            Err(e) => log::warn!("Ledger snapshot for {} failed: {}", user_id, e),
        }
    }

    fn publish_activities(&self, user_id: &str) {
        let mut hub = self.hub.lock();
        if hub.activities.count(user_id) == 0 {
            return;
        }
        match Self::read_activities(&self.db.lock(), user_id) {
            Ok(snapshot) => hub.activities.publish(user_id, snapshot),
            Err(e) => log::warn!("Activity snapshot for {} failed: {}", user_id, e),
        }
    }
}

#[async_trait]
impl Persistence for LocalStore {
    fn subscribe_check_ins(&self, user_id: &str) -> Result<Subscription<Vec<CheckIn>>, TrackerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut hub = self.hub.lock();
            let snapshot = Self::read_check_ins(&self.db.lock(), user_id)?;
            let _ = tx.send(snapshot);
            let id = hub.allocate_id();
            hub.check_ins.add(user_id, id, tx);
            id
        };
        Ok(Subscription::new(rx, self.cancel_handle(Feed::CheckIns, user_id, id)))
    }

    async fn append_check_in(&self, user_id: &str, check_in: CheckIn) -> Result<(), TrackerError> {
        self.db.lock().insert_check_in(user_id, &check_in)?;
        self.publish_check_ins(user_id);
        Ok(())
    }

    fn subscribe_ledger(
        &self,
        user_id: &str,
    ) -> Result<Subscription<Option<DailySpoons>>, TrackerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut hub = self.hub.lock();
            let snapshot = Self::read_ledger(&self.db.lock(), user_id)?;
            let _ = tx.send(snapshot);
            let id = hub.allocate_id();
            hub.ledger.add(user_id, id, tx);
            id
        };
        Ok(Subscription::new(rx, self.cancel_handle(Feed::Ledger, user_id, id)))
    }

    async fn write_ledger(&self, user_id: &str, ledger: DailySpoons) -> Result<(), TrackerError> {
        if ledger.total == 0 || ledger.remaining > ledger.total {
            return Err(TrackerError::InvalidBudget(format!(
                "refusing to store {}/{} spoons",
                ledger.remaining, ledger.total
            )));
        }
        self.db.lock().upsert_ledger(user_id, &ledger)?;
        self.publish_ledger(user_id);
        Ok(())
    }

    fn subscribe_activities(&self, user_id: &str) -> Result<Subscription<Vec<Activity>>, TrackerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut hub = self.hub.lock();
            let snapshot = Self::read_activities(&self.db.lock(), user_id)?;
            let _ = tx.send(snapshot);
            let id = hub.allocate_id();
            hub.activities.add(user_id, id, tx);
            id
        };
        Ok(Subscription::new(rx, self.cancel_handle(Feed::Activities, user_id, id)))
    }

    async fn upsert_activity(&self, user_id: &str, activity: Activity) -> Result<(), TrackerError> {
        if activity.cost == 0 {
            return Err(TrackerError::InvalidBudget(format!(
                "activity '{}' has zero cost",
                activity.id
            )));
        }
        self.db.lock().upsert_activity(user_id, &activity)?;
        self.publish_activities(user_id);
        Ok(())
    }

    async fn delete_activity(&self, user_id: &str, activity_id: &str) -> Result<(), TrackerError> {
        let removed = self.db.lock().delete_activity(user_id, activity_id)?;
        if removed {
            self.publish_activities(user_id);
        }
        Ok(())
    }

    async fn onboarding_seen(&self, user_id: &str) -> Result<bool, TrackerError> {
        Ok(self.db.lock().onboarding_seen(user_id)?)
    }

    async fn set_onboarding_seen(&self, user_id: &str) -> Result<(), TrackerError> {
        Ok(self.db.lock().set_onboarding_seen(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> LocalStore {
        LocalStore::new(Arc::new(Mutex::new(crate::db::test_db())))
    }

    fn check_in(id: &str, timestamp: i64) -> CheckIn {
        CheckIn {
            id: id.to_string(),
            timestamp,
            sensory_load: 30,
            social_battery: 70,
            emotional_intensity: 30,
            physical_fatigue: 30,
            note: None,
        }
    }

    fn ledger(total: u32, remaining: u32) -> DailySpoons {
        DailySpoons {
            date: NaiveDate::from_ymd_opt(2026, 2, 12).unwrap(),
            total,
            remaining,
        }
    }

    #[tokio::test]
    async fn subscribe_pushes_current_snapshot() {
        let store = store();
        let mut sub = store.subscribe_ledger("u1").expect("subscribe");
        assert_eq!(sub.recv().await, Some(None));

        store.write_ledger("u1", ledger(10, 7)).await.expect("write");
        assert_eq!(sub.recv().await, Some(Some(ledger(10, 7))));
    }

    #[tokio::test]
    async fn writes_only_reach_the_owning_user() {
        let store = store();
        let mut mine = store.subscribe_check_ins("u1").expect("subscribe");
        let mut theirs = store.subscribe_check_ins("u2").expect("subscribe");
        assert_eq!(mine.latest(), Some(vec![]));
        assert_eq!(theirs.latest(), Some(vec![]));

        store.append_check_in("u1", check_in("a", 1)).await.expect("append");
        assert_eq!(mine.latest().map(|v| v.len()), Some(1));
        assert_eq!(theirs.latest(), None);
    }

    #[tokio::test]
    async fn check_in_snapshot_is_capped() {
        let store = store();
        for i in 0..60 {
            store
                .append_check_in("u1", check_in(&format!("c{i}"), i))
                .await
                .expect("append");
        }
        let mut sub = store.subscribe_check_ins("u1").expect("subscribe");
        let snapshot = sub.latest().expect("snapshot");
        assert_eq!(snapshot.len(), CHECK_IN_SUBSCRIPTION_LIMIT);
        assert_eq!(snapshot[0].id, "c59");
    }

    #[tokio::test]
    async fn cancel_and_drop_both_unregister() {
        let store = store();
        let a = store.subscribe_activities("u1").expect("subscribe");
        let b = store.subscribe_ledger("u1").expect("subscribe");
        assert_eq!(store.subscriber_count("u1"), 2);

        a.cancel();
        assert_eq!(store.subscriber_count("u1"), 1);
        drop(b);
        assert_eq!(store.subscriber_count("u1"), 0);
    }

    #[tokio::test]
    async fn invalid_ledger_is_refused() {
        let store = store();
        let err = store.write_ledger("u1", ledger(0, 0)).await.expect_err("zero total");
        assert!(matches!(err, TrackerError::InvalidBudget(_)));
        let err = store.write_ledger("u1", ledger(5, 6)).await.expect_err("overfull");
        assert!(matches!(err, TrackerError::InvalidBudget(_)));
    }

    #[tokio::test]
    async fn activity_stream_follows_upserts_and_deletes() {
        let store = store();
        let mut sub = store.subscribe_activities("u1").expect("subscribe");
        assert_eq!(sub.latest(), Some(vec![]));

        let walk = crate::catalog::create("Walk", Some(2), false).expect("create");
        store.upsert_activity("u1", walk.clone()).await.expect("upsert");
        assert_eq!(sub.latest(), Some(vec![walk.clone()]));

        store.delete_activity("u1", &walk.id).await.expect("delete");
        assert_eq!(sub.latest(), Some(vec![]));

        // Deleting something absent does not push a snapshot.
        store.delete_activity("u1", "missing").await.expect("delete");
        assert_eq!(sub.latest(), None);
    }

    #[tokio::test]
    async fn onboarding_flag_round_trips() {
        let store = store();
        assert!(!store.onboarding_seen("u1").await.expect("read"));
        store.set_onboarding_seen("u1").await.expect("write");
        assert!(store.onboarding_seen("u1").await.expect("read"));
    }
}
