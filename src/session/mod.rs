//! Session orchestrator.
//!
//! Owns the signed-in user's view state and the lifecycle of their persistence
//! subscriptions. State only changes when a subscription pushes a snapshot:
//! user actions write through the persistence collaborator and wait for the
//! echo, so the session reflects the last write observed, not the last write
//! issued.
//!
//! Drive it with [`Session::step`] (or [`Session::next_event`] plus
//! [`Session::handle_event`]) from a single task.

pub mod registry;
pub mod view;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use uuid::Uuid;

use crate::advice::{AdviceProvider, MAX_INSIGHT_CHECK_INS};
use crate::catalog::{self, Availability, MAX_CUSTOM_ACTIVITY_COST};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{InlineNotice, TrackerError};
use crate::history;
use crate::identity::Identity;
use crate::ledger::{self, MAX_DAILY_TOTAL, MIN_DAILY_TOTAL};
use crate::onboarding::{self, Advance, Slide};
use crate::persistence::{Persistence, Subscription};
use crate::regulation::{RecoveryNeed, RecoverySession};
use crate::sensory_scan::{self, Question, ScanStep, SensoryScan};
use crate::status::{self, AxisTone};
use crate::types::{
    latest_check_in, Activity, AppStatus, CheckIn, CheckInDraft, DailySpoons, SensoryScanResult,
    UserIdentity, ViewState,
};

pub use registry::{Feed, SubscriptionRegistry, UserFeeds};
pub use view::Screen;

/// External collaborators the session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub persistence: Arc<dyn Persistence>,
    pub identity: Arc<dyn Identity>,
    pub advice: Arc<dyn AdviceProvider>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug)]
pub enum SessionEvent {
    /// The identity feed published a new value.
    UserChanged,
    IdentityClosed,
    CheckIns(Vec<CheckIn>),
    Ledger(Option<DailySpoons>),
    Activities(Vec<Activity>),
    FeedClosed(Feed),
    LoadTimeout,
    RecoveryExitDue,
    Insight { generation: u64, text: String },
}

pub struct Session {
    deps: Collaborators,
    config: Config,

    user: Option<UserIdentity>,
    user_rx: watch::Receiver<Option<UserIdentity>>,
    identity_open: bool,
    registry: SubscriptionRegistry,

    view: ViewState,
    sos_open: bool,
    check_in_open: bool,
    onboarding_step: usize,
    recovery: Option<RecoverySession>,
    scan: Option<SensoryScan>,
    last_scan: Option<SensoryScanResult>,

    check_ins: Vec<CheckIn>,
    ledger: Option<DailySpoons>,
    catalog: Vec<Activity>,
    seed_issued: bool,

    loading: bool,
    load_deadline: Option<Instant>,

    insight: Option<String>,
    insight_pending: bool,
    insight_generation: u64,
    insight_tx: mpsc::UnboundedSender<(u64, String)>,
    insight_rx: mpsc::UnboundedReceiver<(u64, String)>,

    notice: Option<InlineNotice>,
}

async fn recv_opt<T>(sub: Option<&mut Subscription<T>>) -> Option<T> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Validate a draft and stamp it into an immutable check-in.
fn stamp_check_in(draft: CheckInDraft, id: String, timestamp: i64) -> Result<CheckIn, TrackerError> {
    let axes = [
        ("sensory load", draft.sensory_load),
        ("social battery", draft.social_battery),
        ("emotional intensity", draft.emotional_intensity),
        ("physical fatigue", draft.physical_fatigue),
    ];
    for (name, value) in axes {
        if value > 100 {
            return Err(TrackerError::InvalidCheckIn(format!("{name} is {value}, max is 100")));
        }
    }

    Ok(CheckIn {
        id,
        timestamp,
        sensory_load: draft.sensory_load,
        social_battery: draft.social_battery,
        emotional_intensity: draft.emotional_intensity,
        physical_fatigue: draft.physical_fatigue,
        note: draft
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

impl Session {
    pub fn new(deps: Collaborators, config: Config) -> Self {
        let user_rx = deps.identity.current_user();
        let (insight_tx, insight_rx) = mpsc::unbounded_channel();
        Self {
            deps,
            config,
            user: None,
            user_rx,
            identity_open: true,
            registry: SubscriptionRegistry::new(),
            view: ViewState::Auth,
            sos_open: false,
            check_in_open: false,
            onboarding_step: 0,
            recovery: None,
            scan: None,
            last_scan: None,
            check_ins: Vec::new(),
            ledger: None,
            catalog: Vec::new(),
            seed_issued: false,
            loading: false,
            load_deadline: None,
            insight: None,
            insight_pending: false,
            insight_generation: 0,
            insight_tx,
            insight_rx,
            notice: None,
        }
    }

    /// Pick up a user who was already signed in before the session existed.
    pub async fn start(&mut self) {
        self.sync_user().await;
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Wait for the next thing that changes session state.
    pub async fn next_event(&mut self) -> SessionEvent {
        let load_deadline = if self.loading { self.load_deadline } else { None };
        let exit_at = match (&self.recovery, self.view) {
            (Some(recovery), ViewState::Recovery) => recovery.exit_at(),
            _ => None,
        };
        let identity_open = self.identity_open;

        let user_id = self.user.as_ref().map(|u| u.uid.clone());
        let feeds = match user_id.as_deref() {
            Some(id) => self.registry.feeds_mut(id),
            None => None,
        };
        let (check_ins, ledger, activities) = match feeds {
            Some(f) => (f.check_ins.as_mut(), f.ledger.as_mut(), f.activities.as_mut()),
            None => (None, None, None),
        };

        tokio::select! {
            biased;
            changed = self.user_rx.changed(), if identity_open => match changed {
                Ok(()) => SessionEvent::UserChanged,
                Err(_) => SessionEvent::IdentityClosed,
            },
            snapshot = recv_opt(ledger) => match snapshot {
                Some(s) => SessionEvent::Ledger(s),
                None => SessionEvent::FeedClosed(Feed::Ledger),
            },
            snapshot = recv_opt(check_ins) => match snapshot {
                Some(s) => SessionEvent::CheckIns(s),
                None => SessionEvent::FeedClosed(Feed::CheckIns),
            },
            snapshot = recv_opt(activities) => match snapshot {
                Some(s) => SessionEvent::Activities(s),
                None => SessionEvent::FeedClosed(Feed::Activities),
            },
            Some((generation, text)) = self.insight_rx.recv() => {
                SessionEvent::Insight { generation, text }
            }
            _ = sleep_opt(exit_at) => SessionEvent::RecoveryExitDue,
            _ = sleep_opt(load_deadline) => SessionEvent::LoadTimeout,
        }
    }

    /// Next event that is already waiting, without blocking. Timers are not
    /// considered.
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        if self.identity_open && self.user_rx.has_changed().unwrap_or(false) {
            return Some(SessionEvent::UserChanged);
        }

        let user_id = self.user.as_ref().map(|u| u.uid.clone())?;
        if let Some(feeds) = self.registry.feeds_mut(&user_id) {
            if let Some(snapshot) = feeds.ledger.as_mut().and_then(Subscription::try_recv) {
                return Some(SessionEvent::Ledger(snapshot));
            }
            if let Some(snapshot) = feeds.check_ins.as_mut().and_then(Subscription::try_recv) {
                return Some(SessionEvent::CheckIns(snapshot));
            }
            if let Some(snapshot) = feeds.activities.as_mut().and_then(Subscription::try_recv) {
                return Some(SessionEvent::Activities(snapshot));
            }
        }

        self.insight_rx
            .try_recv()
            .ok()
            .map(|(generation, text)| SessionEvent::Insight { generation, text })
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UserChanged => self.sync_user().await,
            SessionEvent::IdentityClosed => {
                log::warn!("Identity feed closed; session keeps its current user");
                self.identity_open = false;
            }
            SessionEvent::CheckIns(list) => self.check_ins = list,
            SessionEvent::Ledger(snapshot) => self.on_ledger(snapshot).await,
            SessionEvent::Activities(list) => self.on_activities(list).await,
            SessionEvent::FeedClosed(feed) => {
                if let Some(uid) = self.current_uid() {
                    log::warn!("{:?} feed closed for {}", feed, uid);
                    if let Some(feeds) = self.registry.feeds_mut(&uid) {
                        feeds.close(feed);
                    }
                }
            }
            SessionEvent::LoadTimeout => {
                if self.loading {
                    log::warn!(
                        "Initial load timed out after {:?} for {}",
                        self.config.load_timeout(),
                        self.current_uid().unwrap_or_default()
                    );
                }
                self.finish_loading();
            }
            SessionEvent::RecoveryExitDue => {
                if self.view == ViewState::Recovery {
                    self.recovery = None;
                    self.set_view(ViewState::Dashboard);
                }
            }
            SessionEvent::Insight { generation, text } => {
                if generation == self.insight_generation {
                    self.insight = Some(text);
                    self.insight_pending = false;
                }
            }
        }
        self.maybe_refresh_insight();
    }

    /// Wait for one event and apply it.
    pub async fn step(&mut self) {
        let event = self.next_event().await;
        self.handle_event(event).await;
    }

    /// Apply every event that is already waiting. Returns how many ran.
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.try_next_event() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    // =========================================================================
    // User lifecycle
    // =========================================================================

    async fn sync_user(&mut self) {
        let next = self.user_rx.borrow_and_update().clone();
        let same_user = match (&self.user, &next) {
            (Some(a), Some(b)) => a.uid == b.uid,
            (None, None) => true,
            _ => false,
        };
        if same_user {
            if next.is_some() {
                self.user = next;
            }
            return;
        }
        self.switch_user(next).await;
    }

    /// Tear down the old user's subscriptions before anything of the new
    /// user's is requested.
    async fn switch_user(&mut self, next: Option<UserIdentity>) {
        let torn_down = self.registry.teardown_all();
        if let Some(previous) = &self.user {
            log::info!(
                "Ending session for {} ({} subscription set(s) cancelled)",
                previous.uid,
                torn_down
            );
        }
        self.reset_user_state();
        self.user = next;

        let Some(user) = self.user.clone() else {
            self.view = ViewState::Auth;
            return;
        };

        self.loading = true;
        self.load_deadline = Some(Instant::now() + self.config.load_timeout());

        self.view = match self.deps.persistence.onboarding_seen(&user.uid).await {
            Ok(true) => ViewState::Dashboard,
            Ok(false) => ViewState::Onboarding,
            Err(e) => {
                log::warn!("Onboarding flag for {} unavailable: {}", user.uid, e);
                self.notice = Some(InlineNotice::from(&e));
                ViewState::Dashboard
            }
        };

        let feeds = self.subscribe_all(&user.uid);
        self.registry.replace(&user.uid, feeds);
        log::info!("Session started for {} on {}", user.uid, self.view.as_str());
    }

    fn subscribe_all(&mut self, user_id: &str) -> UserFeeds {
        let persistence = self.deps.persistence.clone();
        let mut feeds = UserFeeds::default();

        match persistence.subscribe_check_ins(user_id) {
            Ok(sub) => feeds.check_ins = Some(sub),
            Err(e) => self.report_background("check-in subscription", user_id, &e),
        }
        match persistence.subscribe_ledger(user_id) {
            Ok(sub) => feeds.ledger = Some(sub),
            Err(e) => self.report_background("ledger subscription", user_id, &e),
        }
        match persistence.subscribe_activities(user_id) {
            Ok(sub) => feeds.activities = Some(sub),
            Err(e) => self.report_background("activity subscription", user_id, &e),
        }
        feeds
    }

    fn reset_user_state(&mut self) {
        self.sos_open = false;
        self.check_in_open = false;
        self.onboarding_step = 0;
        self.recovery = None;
        self.scan = None;
        self.last_scan = None;
        self.check_ins.clear();
        self.ledger = None;
        self.catalog.clear();
        self.seed_issued = false;
        self.loading = false;
        self.load_deadline = None;
        self.insight = None;
        self.insight_pending = false;
        self.insight_generation += 1;
        self.notice = None;
    }

    fn finish_loading(&mut self) {
        self.loading = false;
        self.load_deadline = None;
    }

    fn report_background(&mut self, what: &str, user_id: &str, err: &TrackerError) {
        log::warn!("{} failed for {}: {}", what, user_id, err);
        self.notice = Some(InlineNotice::from(err));
    }

    // =========================================================================
    // Snapshot handling
    // =========================================================================

    /// Absent ledger: write today's default. Stale ledger: write the rollover.
    /// Either way the echo brings the real state.
    async fn on_ledger(&mut self, snapshot: Option<DailySpoons>) {
        let Some(uid) = self.current_uid() else {
            return;
        };
        let today = self.deps.clock.today();

        match snapshot {
            None => {
                log::info!("No ledger for {}, starting {} spoons", uid, self.config.daily_total());
                let fresh = self.default_ledger();
                self.write_ledger_in_background(&uid, fresh).await;
            }
            Some(stored) if ledger::is_stale(&stored, today) => {
                log::info!("Rolling ledger over for {} ({} -> {})", uid, stored.date, today);
                let rolled = ledger::daily_rollover(&stored, today);
                self.write_ledger_in_background(&uid, rolled).await;
            }
            Some(current) => self.ledger = Some(current),
        }
        self.finish_loading();
    }

    async fn write_ledger_in_background(&mut self, user_id: &str, next: DailySpoons) {
        if let Err(e) = self.deps.persistence.write_ledger(user_id, next).await {
            self.report_background("ledger write", user_id, &e);
        }
    }

    /// Seeds only once per session, so our own empty echoes don't re-seed.
    async fn on_activities(&mut self, list: Vec<Activity>) {
        let Some(uid) = self.current_uid() else {
            return;
        };

        if list.is_empty() && !self.seed_issued {
            self.seed_issued = true;
            let seed = catalog::seed_if_empty(&list);
            log::info!("Seeding {} starter activities for {}", seed.len(), uid);
            for activity in seed {
                if let Err(e) = self.deps.persistence.upsert_activity(&uid, activity).await {
                    self.report_background("activity seed", &uid, &e);
                    break;
                }
            }
        }
        self.catalog = list;
    }

    // =========================================================================
    // Identity actions
    // =========================================================================

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<(), TrackerError> {
        self.deps.identity.sign_up(email, password, display_name).await?;
        self.sync_user().await;
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), TrackerError> {
        self.deps.identity.sign_in(email, password).await?;
        self.sync_user().await;
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), TrackerError> {
        self.deps.identity.sign_out().await?;
        self.sync_user().await;
        Ok(())
    }

    // =========================================================================
    // Check-ins
    // =========================================================================

    pub fn open_check_in(&mut self) -> Result<CheckInDraft, TrackerError> {
        self.require_uid()?;
        self.check_in_open = true;
        Ok(CheckInDraft::default())
    }

    pub fn close_check_in(&mut self) {
        self.check_in_open = false;
    }

    pub async fn record_check_in(&mut self, draft: CheckInDraft) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        let check_in = stamp_check_in(
            draft,
            Uuid::new_v4().to_string(),
            self.deps.clock.now_millis(),
        )?;

        self.deps.persistence.append_check_in(&uid, check_in).await?;
        self.check_in_open = false;
        self.invalidate_insight();
        Ok(())
    }

    // =========================================================================
    // Ledger actions
    // =========================================================================

    /// Spend an activity's cost if it is available right now.
    pub async fn log_activity(&mut self, activity_id: &str) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        let current = self.require_ledger()?;
        let activity = catalog::find(&self.catalog, activity_id)
            .ok_or_else(|| TrackerError::InvalidActivity(format!("no activity '{activity_id}'")))?;

        match catalog::availability(activity, &current) {
            Availability::Available => {}
            reason => {
                log::debug!("{} not available for {}: {:?}", activity.id, uid, reason);
                return Err(TrackerError::ActivityUnavailable(activity.name.clone()));
            }
        }

        let next = ledger::spend(&current, activity.cost);
        self.deps.persistence.write_ledger(&uid, next).await
    }

    pub async fn reset_day(&mut self) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        let current = self.require_ledger()?;
        self.deps
            .persistence
            .write_ledger(&uid, ledger::reset_to_full(&current))
            .await
    }

    pub async fn set_daily_total(&mut self, new_total: u32) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        if !(MIN_DAILY_TOTAL..=MAX_DAILY_TOTAL).contains(&new_total) {
            return Err(TrackerError::InvalidBudget(format!(
                "daily total must be between {MIN_DAILY_TOTAL} and {MAX_DAILY_TOTAL}, got {new_total}"
            )));
        }
        let current = self.require_ledger()?;
        let next = ledger::set_total(&current, new_total)?;
        self.deps.persistence.write_ledger(&uid, next).await
    }

    // =========================================================================
    // Catalog actions
    // =========================================================================

    pub async fn create_activity(
        &mut self,
        name: &str,
        cost: Option<u32>,
        is_critical: bool,
    ) -> Result<Activity, TrackerError> {
        let uid = self.require_uid()?;
        if let Some(cost) = cost {
            if cost > MAX_CUSTOM_ACTIVITY_COST {
                return Err(TrackerError::InvalidBudget(format!(
                    "custom activities cost at most {MAX_CUSTOM_ACTIVITY_COST}, got {cost}"
                )));
            }
        }
        let activity = catalog::create(name, cost, is_critical)?;
        self.deps
            .persistence
            .upsert_activity(&uid, activity.clone())
            .await?;
        Ok(activity)
    }

    pub async fn toggle_pin(&mut self, activity_id: &str) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        let toggled = catalog::find(&self.catalog, activity_id)
            .map(catalog::toggle_pin)
            .ok_or_else(|| TrackerError::InvalidActivity(format!("no activity '{activity_id}'")))?;
        self.deps.persistence.upsert_activity(&uid, toggled).await
    }

    pub async fn delete_activity(&mut self, activity_id: &str) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        catalog::ensure_deletable(activity_id)?;
        if catalog::find(&self.catalog, activity_id).is_none() {
            return Err(TrackerError::InvalidActivity(format!("no activity '{activity_id}'")));
        }
        self.deps.persistence.delete_activity(&uid, activity_id).await
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn open_view(&mut self, to: ViewState) -> Result<(), TrackerError> {
        self.require_uid()?;
        if !view::can_navigate(self.view, to) {
            return Err(TrackerError::InvalidTransition { from: self.view, to });
        }
        if self.view == ViewState::SensoryScan {
            self.scan = None;
        }
        if to == ViewState::SensoryScan {
            self.scan = Some(SensoryScan::new());
        }
        self.set_view(to);
        Ok(())
    }

    fn set_view(&mut self, to: ViewState) {
        if self.view != to {
            log::debug!("View {} -> {}", self.view.as_str(), to.as_str());
        }
        self.view = to;
        self.maybe_refresh_insight();
    }

    pub async fn advance_onboarding(&mut self) -> Result<(), TrackerError> {
        let uid = self.require_uid()?;
        if self.view != ViewState::Onboarding {
            return Err(TrackerError::InvalidTransition {
                from: self.view,
                to: ViewState::Dashboard,
            });
        }

        match onboarding::advance(self.onboarding_step) {
            Advance::Next(step) => self.onboarding_step = step,
            Advance::Finished => {
                self.deps.persistence.set_onboarding_seen(&uid).await?;
                log::info!("Onboarding finished for {}", uid);
                self.onboarding_step = 0;
                self.set_view(ViewState::Dashboard);
            }
        }
        Ok(())
    }

    // =========================================================================
    // SOS and recovery
    // =========================================================================

    /// SOS is the only way into recovery, so refusing it reports that edge.
    pub fn open_sos(&mut self) -> Result<(), TrackerError> {
        self.require_uid()?;
        if !view::shows_sos_button(self.view) {
            return Err(TrackerError::InvalidTransition {
                from: self.view,
                to: ViewState::Recovery,
            });
        }
        self.sos_open = true;
        Ok(())
    }

    pub fn close_sos(&mut self) {
        self.sos_open = false;
    }

    pub fn activate_recovery(&mut self) -> Result<(), TrackerError> {
        self.require_uid()?;
        if !self.sos_open {
            return Err(TrackerError::InvalidTransition {
                from: self.view,
                to: ViewState::Recovery,
            });
        }
        self.sos_open = false;
        self.scan = None;
        self.recovery = Some(RecoverySession::start(Instant::now()));
        log::info!("Recovery mode on for {}", self.current_uid().unwrap_or_default());
        self.set_view(ViewState::Recovery);
        Ok(())
    }

    pub fn toggle_recovery_need(&mut self, need: RecoveryNeed) -> Result<(), TrackerError> {
        let from = self.view;
        let recovery = self.recovery_mut(from)?;
        recovery.toggle(need);
        Ok(())
    }

    /// Start the delayed exit. `Ok(false)` if an exit is already under way.
    pub fn request_recovery_exit(&mut self) -> Result<bool, TrackerError> {
        let from = self.view;
        let delay = self.config.recovery_exit_delay();
        let recovery = self.recovery_mut(from)?;
        Ok(recovery.request_exit(Instant::now(), delay))
    }

    fn recovery_mut(&mut self, from: ViewState) -> Result<&mut RecoverySession, TrackerError> {
        match (from, self.recovery.as_mut()) {
            (ViewState::Recovery, Some(recovery)) => Ok(recovery),
            _ => Err(TrackerError::InvalidTransition {
                from,
                to: ViewState::Dashboard,
            }),
        }
    }

    // =========================================================================
    // Sensory scan
    // =========================================================================

    /// Answer the current question. Returns the result after the last one.
    pub fn answer_scan(&mut self, yes: bool) -> Result<Option<SensoryScanResult>, TrackerError> {
        self.require_uid()?;
        let step = match (self.view, self.scan.as_mut()) {
            (ViewState::SensoryScan, Some(scan)) => scan.answer(yes),
            (from, _) => {
                return Err(TrackerError::InvalidTransition {
                    from,
                    to: ViewState::SensoryScan,
                })
            }
        };

        match step {
            ScanStep::Ask(_) => Ok(None),
            ScanStep::Done(flags) => {
                let result = sensory_scan::into_result(
                    Uuid::new_v4().to_string(),
                    self.deps.clock.now_millis(),
                    flags,
                );
                self.scan = None;
                self.last_scan = Some(result.clone());
                self.set_view(ViewState::Dashboard);
                Ok(Some(result))
            }
        }
    }

    pub fn cancel_scan(&mut self) -> Result<(), TrackerError> {
        self.open_view(ViewState::Dashboard)
    }

    // =========================================================================
    // Insight
    // =========================================================================

    /// Drop the cached insight and fetch a new one.
    pub fn refresh_insight(&mut self) -> Result<(), TrackerError> {
        self.require_uid()?;
        self.invalidate_insight();
        self.spawn_insight();
        Ok(())
    }

    fn invalidate_insight(&mut self) {
        self.insight = None;
        self.insight_pending = false;
        self.insight_generation += 1;
    }

    /// Fetch automatically when the dashboard has data but no insight yet.
    fn maybe_refresh_insight(&mut self) {
        if self.view == ViewState::Dashboard
            && !self.check_ins.is_empty()
            && self.insight.is_none()
            && !self.insight_pending
        {
            self.spawn_insight();
        }
    }

    fn spawn_insight(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::debug!("No runtime; skipping insight request");
            return;
        };

        let mut recent = self.check_ins.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(MAX_INSIGHT_CHECK_INS);

        let advice = self.deps.advice.clone();
        let tx = self.insight_tx.clone();
        let generation = self.insight_generation;
        self.insight_pending = true;

        handle.spawn(async move {
            let text = advice.get_insight(&recent).await;
            let _ = tx.send((generation, text));
        });
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn current_uid(&self) -> Option<String> {
        self.user.as_ref().map(|u| u.uid.clone())
    }

    fn require_uid(&self) -> Result<String, TrackerError> {
        self.current_uid().ok_or(TrackerError::NotSignedIn)
    }

    /// Today's ledger. A stored ledger from an earlier day reads as today's
    /// full budget until the rollover echo arrives.
    fn require_ledger(&self) -> Result<DailySpoons, TrackerError> {
        self.ledger
            .map(|l| ledger::daily_rollover(&l, self.deps.clock.today()))
            .ok_or_else(|| {
                TrackerError::PersistenceUnavailable("today's budget has not loaded yet".to_string())
            })
    }

    fn default_ledger(&self) -> DailySpoons {
        let total = self.config.daily_total();
        DailySpoons {
            date: self.deps.clock.today(),
            total,
            remaining: total,
        }
    }

    /// The ledger status is computed from. Before the first snapshot this is
    /// a full default day.
    pub fn effective_ledger(&self) -> DailySpoons {
        self.require_ledger().unwrap_or_else(|_| self.default_ledger())
    }

    pub fn status(&self) -> AppStatus {
        status::derive_status(&self.effective_ledger(), latest_check_in(&self.check_ins))
    }

    pub fn screen(&self) -> Screen {
        view::visible_screen(self.view, self.loading)
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn ledger(&self) -> Option<&DailySpoons> {
        self.ledger.as_ref()
    }

    pub fn is_low_energy(&self) -> bool {
        self.require_ledger().map(|l| ledger::is_low_energy(&l)).unwrap_or(false)
    }

    pub fn check_ins(&self) -> &[CheckIn] {
        &self.check_ins
    }

    pub fn latest_check_in(&self) -> Option<&CheckIn> {
        latest_check_in(&self.check_ins)
    }

    pub fn check_in_tones(&self) -> Option<[(&'static str, AxisTone); 4]> {
        self.latest_check_in().map(status::check_in_tones)
    }

    pub fn history(&self) -> Option<Vec<&CheckIn>> {
        history::history_series(&self.check_ins)
    }

    pub fn catalog(&self) -> &[Activity] {
        &self.catalog
    }

    /// Pinned activities with whether each can be logged right now.
    pub fn dashboard_activities(&self) -> Vec<(&Activity, Availability)> {
        let ledger = self.effective_ledger();
        catalog::dashboard_view(&self.catalog)
            .into_iter()
            .map(|a| (a, catalog::availability(a, &ledger)))
            .collect()
    }

    pub fn library_activities(&self) -> Vec<&Activity> {
        catalog::library_view(&self.catalog)
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    pub fn is_insight_pending(&self) -> bool {
        self.insight_pending
    }

    pub fn is_sos_open(&self) -> bool {
        self.sos_open
    }

    pub fn is_check_in_open(&self) -> bool {
        self.check_in_open
    }

    pub fn recovery(&self) -> Option<&RecoverySession> {
        self.recovery.as_ref()
    }

    pub fn onboarding_slide(&self) -> Option<&'static Slide> {
        if self.view == ViewState::Onboarding {
            onboarding::slide(self.onboarding_step)
        } else {
            None
        }
    }

    pub fn scan_question(&self) -> Option<&'static Question> {
        self.scan.as_ref().and_then(SensoryScan::current_question)
    }

    pub fn last_scan(&self) -> Option<&SensoryScanResult> {
        self.last_scan.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<InlineNotice> {
        self.notice.take()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.registry.len()
    }
}
