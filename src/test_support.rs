//! Test doubles for the external collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::advice::AdviceProvider;
use crate::error::TrackerError;
use crate::persistence::{Persistence, Subscription, SubscriptionHandle};
use crate::types::{Activity, CheckIn, DailySpoons};

/// A store whose subscriptions never deliver and whose writes always fail.
///
/// The onboarding flag reads as seen so sessions land on the dashboard.
pub struct OfflineStore {
    check_in_senders: Mutex<Vec<mpsc::UnboundedSender<Vec<CheckIn>>>>,
    ledger_senders: Mutex<Vec<mpsc::UnboundedSender<Option<DailySpoons>>>>,
    activity_senders: Mutex<Vec<mpsc::UnboundedSender<Vec<Activity>>>>,
    write_attempts: AtomicUsize,
}

impl OfflineStore {
    pub fn new() -> Self {
        Self {
            check_in_senders: Mutex::new(Vec::new()),
            ledger_senders: Mutex::new(Vec::new()),
            activity_senders: Mutex::new(Vec::new()),
            write_attempts: AtomicUsize::new(0),
        }
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn refuse(&self) -> Result<(), TrackerError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(TrackerError::PersistenceUnavailable("offline".to_string()))
    }
}

fn silent<T>(senders: &Mutex<Vec<mpsc::UnboundedSender<T>>>) -> Subscription<T> {
    let (tx, rx) = mpsc::unbounded_channel();
    // Keep the sender so the stream stays open but quiet.
    senders.lock().push(tx);
    Subscription::new(rx, SubscriptionHandle::noop())
}

#[async_trait]
impl Persistence for OfflineStore {
    fn subscribe_check_ins(&self, _user_id: &str) -> Result<Subscription<Vec<CheckIn>>, TrackerError> {
        Ok(silent(&self.check_in_senders))
    }

    async fn append_check_in(&self, _user_id: &str, _check_in: CheckIn) -> Result<(), TrackerError> {
        self.refuse()
    }

    fn subscribe_ledger(
        &self,
        _user_id: &str,
    ) -> Result<Subscription<Option<DailySpoons>>, TrackerError> {
        Ok(silent(&self.ledger_senders))
    }

    async fn write_ledger(&self, _user_id: &str, _ledger: DailySpoons) -> Result<(), TrackerError> {
        self.refuse()
    }

    fn subscribe_activities(&self, _user_id: &str) -> Result<Subscription<Vec<Activity>>, TrackerError> {
        Ok(silent(&self.activity_senders))
    }

    async fn upsert_activity(&self, _user_id: &str, _activity: Activity) -> Result<(), TrackerError> {
        self.refuse()
    }

    async fn delete_activity(&self, _user_id: &str, _activity_id: &str) -> Result<(), TrackerError> {
        self.refuse()
    }

    async fn onboarding_seen(&self, _user_id: &str) -> Result<bool, TrackerError> {
        Ok(true)
    }

    async fn set_onboarding_seen(&self, _user_id: &str) -> Result<(), TrackerError> {
        self.refuse()
    }
}

/// Advice provider that always answers the same text and records its calls.
pub struct ScriptedAdvisor {
    reply: String,
    calls: AtomicUsize,
    last_input_len: AtomicUsize,
}

impl ScriptedAdvisor {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_input_len: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input_len(&self) -> usize {
        self.last_input_len.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdviceProvider for ScriptedAdvisor {
    async fn get_insight(&self, recent: &[CheckIn]) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_input_len.store(recent.len(), Ordering::SeqCst);
        self.reply.clone()
    }
}
