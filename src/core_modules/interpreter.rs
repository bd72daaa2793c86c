// THEORY:
// The `interpreter` is the only stateful component of the pipeline. It owns one
// `DetectionSession` worth of state and turns the per-frame classifier verdicts
// into a verification narrative: progress climbing toward 100, warnings when
// the subject drifts, and the terminal outcomes of the session.
//
// Key architectural principles:
// 1.  **State machine, not averages**: Absent -> Detecting -> Verified, with a
//     MultiplePeople condition reachable from any non-terminal state and an
//     Aborted terminal for sustained absence. Verified is monotonic: once a
//     session verifies it never un-verifies.
// 2.  **Edge-triggered warnings**: a warning class is emitted when the session
//     transitions into that condition, never re-emitted tick after tick. The
//     caller's notification surface stays quiet while nothing changes.
// 3.  **Leniency over enforcement**: a session that has not verified within the
//     session timeout is force-verified. The system prefers letting a
//     legitimate user through over blocking on a flaky camera or bad lighting.
// 4.  **No panics**: every tick is total. Terminal states make ticks no-ops
//     that report the unchanged state.

use crate::core_modules::frame_analyzer::ClassificationResult;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Progress gained on a clean single-face tick.
const PROGRESS_INCREMENT: u8 = 2;
/// Progress lost when multiple people are in frame.
const MULTIPLE_PEOPLE_PENALTY: u8 = 2;
/// Progress lost on an absence tick.
const ABSENCE_PENALTY: u8 = 1;

/// Tunables of the session state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Consecutive absence ticks after which the session aborts.
    pub max_absence_ticks: u32,
    /// Wall-clock bound after which an unverified session auto-passes.
    pub session_timeout: Duration,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_absence_ticks: 5,
            session_timeout: Duration::from_secs(30),
        }
    }
}

/// Where a detection session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No face seen yet, or all accumulated progress has drained away.
    Absent,
    /// A face is being accumulated toward verification (progress 1-99).
    Detecting,
    /// More than one person is in frame.
    MultiplePeople,
    /// Verification complete. Terminal and monotonic within a session.
    Verified,
    /// The subject left the frame for too long. Terminal until an explicit restart.
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Verified | SessionState::Aborted)
    }
}

/// Warning classes surfaced to the caller. Edge-triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    NoFace,
    MultiplePeople,
}

/// Which warning condition the caller was last told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifiedCondition {
    None,
    NoFace,
    MultiplePeople,
}

/// The per-tick report handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Rolling verification progress, always within 0-100.
    pub progress: u8,
    pub state: SessionState,
    /// Set only on the tick that enters a warning condition.
    pub warning: Option<Warning>,
    /// Set on exactly the one tick where the session reaches Verified.
    pub just_verified: bool,
    /// True when verification came from the session-timeout leniency path.
    pub auto_passed: bool,
}

impl TickOutcome {
    /// A human-readable status line for a UI surface.
    pub fn status_line(&self) -> String {
        match self.state {
            SessionState::Verified => "Face verification completed!".to_string(),
            SessionState::Aborted => "Face detection stopped - Please start again".to_string(),
            SessionState::MultiplePeople => {
                "Multiple people detected - Only one person allowed".to_string()
            }
            SessionState::Absent => format!(
                "Position your face clearly in the camera frame ({}%)",
                self.progress
            ),
            SessionState::Detecting => {
                if self.warning == Some(Warning::NoFace) {
                    format!(
                        "Position your face clearly in the camera frame ({}%)",
                        self.progress
                    )
                } else {
                    format!("Face detected... {}%", self.progress)
                }
            }
        }
    }
}

/// The state machine for one detection session, driven once per sampling tick.
pub struct PresenceInterpreter {
    config: InterpreterConfig,
    progress: u8,
    consecutive_absence: u32,
    verified: bool,
    state: SessionState,
    last_notified: NotifiedCondition,
    started_at: Instant,
}

impl PresenceInterpreter {
    /// Begins a fresh session. The session timeout clock starts now.
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            progress: 0,
            consecutive_absence: 0,
            verified: false,
            state: SessionState::Absent,
            last_notified: NotifiedCondition::None,
            started_at: Instant::now(),
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn consecutive_absence(&self) -> u32 {
        self.consecutive_absence
    }

    /// Discards all session state and starts over. This is the explicit
    /// recovery path after an abort; it is never taken automatically.
    pub fn restart(&mut self) {
        debug!("presence session restarted");
        self.progress = 0;
        self.consecutive_absence = 0;
        self.verified = false;
        self.state = SessionState::Absent;
        self.last_notified = NotifiedCondition::None;
        self.started_at = Instant::now();
    }

    /// Advances the session by one classifier verdict.
    pub fn tick(&mut self, classification: &ClassificationResult) -> TickOutcome {
        self.tick_at(classification, Instant::now())
    }

    /// `tick` with an explicit clock, so the timeout path is testable.
    pub fn tick_at(&mut self, classification: &ClassificationResult, now: Instant) -> TickOutcome {
        if self.state.is_terminal() {
            return self.unchanged_outcome();
        }

        if now.duration_since(self.started_at) >= self.config.session_timeout {
            info!("session timeout reached without verification, auto-passing");
            return self.force_verify(true);
        }

        if classification.multiple_people {
            self.progress = self.progress.saturating_sub(MULTIPLE_PEOPLE_PENALTY);
            self.state = SessionState::MultiplePeople;
            let warning = self.notify(NotifiedCondition::MultiplePeople, Warning::MultiplePeople);
            return TickOutcome {
                progress: self.progress,
                state: self.state,
                warning,
                just_verified: false,
                auto_passed: false,
            };
        }

        if classification.face_detected {
            self.progress = (self.progress + PROGRESS_INCREMENT).min(100);
            self.consecutive_absence = 0;
            self.last_notified = NotifiedCondition::None;

            if self.progress >= 100 {
                return self.force_verify(false);
            }

            self.state = SessionState::Detecting;
            return TickOutcome {
                progress: self.progress,
                state: self.state,
                warning: None,
                just_verified: false,
                auto_passed: false,
            };
        }

        // Absence tick.
        self.progress = self.progress.saturating_sub(ABSENCE_PENALTY);
        self.consecutive_absence += 1;
        let warning = self.notify(NotifiedCondition::NoFace, Warning::NoFace);

        if self.consecutive_absence >= self.config.max_absence_ticks {
            warn!(
                "aborting session after {} consecutive absence ticks",
                self.consecutive_absence
            );
            self.state = SessionState::Aborted;
        } else if self.progress == 0 {
            self.state = SessionState::Absent;
        } else {
            self.state = SessionState::Detecting;
        }

        TickOutcome {
            progress: self.progress,
            state: self.state,
            warning,
            just_verified: false,
            auto_passed: false,
        }
    }

    /// Forces the session to Verified if it is not already terminal. Used by
    /// the sampling loop when the timeout elapses between ready frames, and by
    /// the camera-failure fallback.
    pub fn force_verify_at(&mut self, now: Instant) -> Option<TickOutcome> {
        if self.state.is_terminal() {
            return None;
        }
        if now.duration_since(self.started_at) >= self.config.session_timeout {
            info!("session timeout reached without verification, auto-passing");
            return Some(self.force_verify(true));
        }
        None
    }

    fn force_verify(&mut self, auto_passed: bool) -> TickOutcome {
        self.verified = true;
        self.state = SessionState::Verified;
        self.last_notified = NotifiedCondition::None;
        if !auto_passed {
            info!("face verification completed at progress {}", self.progress);
        }
        TickOutcome {
            progress: self.progress,
            state: self.state,
            warning: None,
            just_verified: true,
            auto_passed,
        }
    }

    fn unchanged_outcome(&self) -> TickOutcome {
        TickOutcome {
            progress: self.progress,
            state: self.state,
            warning: None,
            just_verified: false,
            auto_passed: false,
        }
    }

    /// Emits a warning only when the condition differs from the last one the
    /// caller was told about.
    fn notify(&mut self, condition: NotifiedCondition, warning: Warning) -> Option<Warning> {
        if self.last_notified == condition {
            None
        } else {
            self.last_notified = condition;
            Some(warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE: ClassificationResult = ClassificationResult {
        face_detected: true,
        multiple_people: false,
        confidence: 80.0,
    };
    const ABSENT: ClassificationResult = ClassificationResult {
        face_detected: false,
        multiple_people: false,
        confidence: 0.0,
    };
    const CROWD: ClassificationResult = ClassificationResult {
        face_detected: false,
        multiple_people: true,
        confidence: 0.0,
    };

    fn interpreter() -> (PresenceInterpreter, Instant) {
        let interpreter = PresenceInterpreter::new(InterpreterConfig::default());
        let start = Instant::now();
        (interpreter, start)
    }

    #[test]
    fn fifty_face_ticks_verify_the_session() {
        let (mut it, now) = interpreter();
        let mut verified_ticks = 0;
        for i in 1..=60 {
            let outcome = it.tick_at(&FACE, now);
            if outcome.just_verified {
                verified_ticks += 1;
                assert_eq!(i, 50);
                assert!(!outcome.auto_passed);
            }
        }
        assert_eq!(verified_ticks, 1);
        assert_eq!(it.state(), SessionState::Verified);
        assert_eq!(it.progress(), 100);
    }

    #[test]
    fn progress_stays_within_bounds() {
        let (mut it, now) = interpreter();
        for _ in 0..200 {
            let outcome = it.tick_at(&FACE, now);
            assert!(outcome.progress <= 100);
        }
        let mut it = PresenceInterpreter::new(InterpreterConfig {
            max_absence_ticks: 1_000,
            ..InterpreterConfig::default()
        });
        for _ in 0..200 {
            let outcome = it.tick_at(&CROWD, now);
            assert!(outcome.progress == 0 || outcome.progress <= 100);
        }
        assert_eq!(it.progress(), 0);
    }

    #[test]
    fn absence_count_resets_on_a_single_face_tick() {
        let (mut it, now) = interpreter();
        it.tick_at(&ABSENT, now);
        it.tick_at(&ABSENT, now);
        it.tick_at(&ABSENT, now);
        assert_eq!(it.consecutive_absence(), 3);
        it.tick_at(&FACE, now);
        assert_eq!(it.consecutive_absence(), 0);
    }

    #[test]
    fn session_aborts_after_max_absence_ticks() {
        let (mut it, now) = interpreter();
        for _ in 0..4 {
            let outcome = it.tick_at(&ABSENT, now);
            assert_ne!(outcome.state, SessionState::Aborted);
        }
        let outcome = it.tick_at(&ABSENT, now);
        assert_eq!(outcome.state, SessionState::Aborted);

        // Aborted is sticky: nothing moves until a restart.
        let frozen = it.tick_at(&FACE, now);
        assert_eq!(frozen.state, SessionState::Aborted);
        assert_eq!(frozen.progress, outcome.progress);
    }

    #[test]
    fn restart_recovers_an_aborted_session() {
        let (mut it, now) = interpreter();
        for _ in 0..5 {
            it.tick_at(&ABSENT, now);
        }
        assert_eq!(it.state(), SessionState::Aborted);
        it.restart();
        assert_eq!(it.state(), SessionState::Absent);
        assert_eq!(it.progress(), 0);
        let outcome = it.tick_at(&FACE, Instant::now());
        assert_eq!(outcome.state, SessionState::Detecting);
        assert_eq!(outcome.progress, 2);
    }

    #[test]
    fn timeout_auto_passes_exactly_once() {
        let (mut it, now) = interpreter();
        it.tick_at(&ABSENT, now);
        let late = now + Duration::from_secs(31);
        let outcome = it.tick_at(&ABSENT, late);
        assert!(outcome.just_verified);
        assert!(outcome.auto_passed);
        assert_eq!(outcome.state, SessionState::Verified);

        let next = it.tick_at(&ABSENT, late);
        assert!(!next.just_verified);
        assert_eq!(next.state, SessionState::Verified);
    }

    #[test]
    fn verified_is_monotonic() {
        let (mut it, now) = interpreter();
        for _ in 0..50 {
            it.tick_at(&FACE, now);
        }
        assert!(it.is_verified());
        it.tick_at(&CROWD, now);
        it.tick_at(&ABSENT, now);
        assert_eq!(it.state(), SessionState::Verified);
        assert!(it.is_verified());
    }

    #[test]
    fn warnings_are_edge_triggered() {
        let mut it = PresenceInterpreter::new(InterpreterConfig {
            max_absence_ticks: 100,
            ..InterpreterConfig::default()
        });
        let now = Instant::now();

        assert_eq!(it.tick_at(&ABSENT, now).warning, Some(Warning::NoFace));
        assert_eq!(it.tick_at(&ABSENT, now).warning, None);

        assert_eq!(it.tick_at(&CROWD, now).warning, Some(Warning::MultiplePeople));
        assert_eq!(it.tick_at(&CROWD, now).warning, None);

        // Switching back to absence is a new edge.
        assert_eq!(it.tick_at(&ABSENT, now).warning, Some(Warning::NoFace));

        // A clean face tick clears the notified condition entirely.
        it.tick_at(&FACE, now);
        assert_eq!(it.tick_at(&ABSENT, now).warning, Some(Warning::NoFace));
    }

    #[test]
    fn multiple_people_drains_progress() {
        let (mut it, now) = interpreter();
        for _ in 0..10 {
            it.tick_at(&FACE, now);
        }
        assert_eq!(it.progress(), 20);
        let outcome = it.tick_at(&CROWD, now);
        assert_eq!(outcome.progress, 18);
        assert_eq!(outcome.state, SessionState::MultiplePeople);
    }

    #[test]
    fn force_verify_at_respects_the_deadline() {
        let (mut it, now) = interpreter();
        assert!(it.force_verify_at(now).is_none());
        let outcome = it.force_verify_at(now + Duration::from_secs(30)).unwrap();
        assert!(outcome.just_verified && outcome.auto_passed);
        assert!(it.force_verify_at(now + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn status_lines_match_the_session_condition() {
        let (mut it, now) = interpreter();
        let absent = it.tick_at(&ABSENT, now);
        assert!(absent.status_line().starts_with("Position your face"));
        let face = it.tick_at(&FACE, now);
        assert!(face.status_line().starts_with("Face detected"));
        let crowd = it.tick_at(&CROWD, now);
        assert_eq!(
            crowd.status_line(),
            "Multiple people detected - Only one person allowed"
        );
    }
}
