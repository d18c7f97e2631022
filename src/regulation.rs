//! Calming tools: the breathing pacer, the SOS card and recovery mode.

use std::time::Duration;

use tokio::time::Instant;

// =============================================================================
// Breathing pacer (4-4-4)
// =============================================================================

pub const BREATH_PHASE_LENGTH: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    pub fn label(&self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Breathe in",
            BreathPhase::Hold => "Hold",
            BreathPhase::Exhale => "Breathe out",
        }
    }

    /// Size of the pacer circle relative to rest.
    pub fn target_scale(&self) -> f32 {
        match self {
            BreathPhase::Inhale | BreathPhase::Hold => 1.5,
            BreathPhase::Exhale => 1.0,
        }
    }
}

/// Phase after `elapsed` since the pacer started. Cycles every 12 s.
pub fn breath_phase_at(elapsed: Duration) -> BreathPhase {
    let step = elapsed.as_millis() / BREATH_PHASE_LENGTH.as_millis();
    match step % 3 {
        0 => BreathPhase::Inhale,
        1 => BreathPhase::Hold,
        _ => BreathPhase::Exhale,
    }
}

// =============================================================================
// SOS card
// =============================================================================

/// Shown full-screen to bystanders.
pub const SOS_CARD_LINES: [&str; 3] = [
    "I am in sensory overload (shutdown). Please don't ask me questions.",
    "I need calm and time.",
    "Show this screen to the people around you.",
];

// =============================================================================
// Recovery mode
// =============================================================================

pub const RECOVERY_EXIT_MESSAGE: &str =
    "The world is still there. Take your time going back. You did well to stop.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryNeed {
    Water,
    DimLight,
    SimpleFood,
    LieDown,
}

impl RecoveryNeed {
    pub const ALL: [RecoveryNeed; 4] = [
        RecoveryNeed::Water,
        RecoveryNeed::DimLight,
        RecoveryNeed::SimpleFood,
        RecoveryNeed::LieDown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RecoveryNeed::Water => "Take a sip of water",
            RecoveryNeed::DimLight => "Dim the light or go dark",
            RecoveryNeed::SimpleFood => "Eat something simple",
            RecoveryNeed::LieDown => "Lie down, do nothing",
        }
    }

    fn index(&self) -> usize {
        match self {
            RecoveryNeed::Water => 0,
            RecoveryNeed::DimLight => 1,
            RecoveryNeed::SimpleFood => 2,
            RecoveryNeed::LieDown => 3,
        }
    }
}

/// State of one stay in recovery mode. Lives only in memory.
#[derive(Debug, Clone)]
pub struct RecoverySession {
    entered_at: Instant,
    checked: [bool; 4],
    exit_at: Option<Instant>,
}

impl RecoverySession {
    pub fn start(now: Instant) -> Self {
        Self {
            entered_at: now,
            checked: [false; 4],
            exit_at: None,
        }
    }

    /// Whole minutes spent paused.
    pub fn minutes_paused(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.entered_at).as_secs() / 60
    }

    pub fn toggle(&mut self, need: RecoveryNeed) {
        let slot = &mut self.checked[need.index()];
        *slot = !*slot;
    }

    pub fn is_checked(&self, need: RecoveryNeed) -> bool {
        self.checked[need.index()]
    }

    /// Start the gentle exit. Returns false if an exit is already under way.
    pub fn request_exit(&mut self, now: Instant, delay: Duration) -> bool {
        if self.exit_at.is_some() {
            return false;
        }
        self.exit_at = Some(now + delay);
        true
    }

    pub fn is_exiting(&self) -> bool {
        self.exit_at.is_some()
    }

    pub fn exit_at(&self) -> Option<Instant> {
        self.exit_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breath_cycle() {
        let at = |ms| breath_phase_at(Duration::from_millis(ms));
        assert_eq!(at(0), BreathPhase::Inhale);
        assert_eq!(at(3_999), BreathPhase::Inhale);
        assert_eq!(at(4_000), BreathPhase::Hold);
        assert_eq!(at(8_000), BreathPhase::Exhale);
        assert_eq!(at(12_000), BreathPhase::Inhale);
        assert_eq!(BreathPhase::Hold.target_scale(), 1.5);
        assert_eq!(BreathPhase::Exhale.target_scale(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minutes_paused_counts_whole_minutes() {
        let session = RecoverySession::start(Instant::now());
        tokio::time::advance(Duration::from_secs(119)).await;
        assert_eq!(session.minutes_paused(Instant::now()), 1);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(session.minutes_paused(Instant::now()), 2);
    }

    #[test]
    fn test_needs_toggle_independently() {
        let mut session = RecoverySession::start(Instant::now());
        session.toggle(RecoveryNeed::Water);
        session.toggle(RecoveryNeed::LieDown);
        session.toggle(RecoveryNeed::LieDown);
        assert!(session.is_checked(RecoveryNeed::Water));
        assert!(!session.is_checked(RecoveryNeed::LieDown));
        assert!(!session.is_checked(RecoveryNeed::DimLight));
    }

    #[test]
    fn test_second_exit_request_is_ignored() {
        let now = Instant::now();
        let mut session = RecoverySession::start(now);
        assert!(session.request_exit(now, Duration::from_millis(3500)));
        assert!(!session.request_exit(now + Duration::from_secs(1), Duration::from_millis(3500)));
        assert_eq!(session.exit_at(), Some(now + Duration::from_millis(3500)));
    }
}
