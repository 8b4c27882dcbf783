//! Engine error recovery
//!
//! Policy per fatal error:
//! - network: reload the current source
//! - media: repair the decoding pipeline
//! - anything else: dispose of the engine
//!
//! Non-fatal errors are left to the engine. Consecutive recoveries without buffered
//! progress in between are capped by [`RecoveryPolicy`]; past the cap the session is
//! terminated like an unrecoverable error. `Terminated` absorbs every later event.

use crate::engine::{EngineError, ErrorCategory, StreamingEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Default cap on consecutive recovery attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Engine session health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryState {
    #[default]
    Healthy,
    /// Reloading after a fatal network error. `attempts` counts consecutive
    /// recoveries of any kind since the session was last healthy.
    RecoveringNetwork { attempts: u32 },
    /// Repairing the media pipeline after a fatal media error
    RecoveringMedia { attempts: u32 },
    Terminated,
}

impl RecoveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecoveryState::Terminated)
    }

    /// Consecutive recovery attempts so far
    pub fn attempts(&self) -> u32 {
        match self {
            RecoveryState::RecoveringNetwork { attempts }
            | RecoveryState::RecoveringMedia { attempts } => *attempts,
            _ => 0,
        }
    }

    /// React to an engine error
    pub fn transition(self, err: &EngineError, policy: &RecoveryPolicy) -> (RecoveryState, RecoveryAction) {
        if self.is_terminal() || !err.fatal {
            return (self, RecoveryAction::None);
        }

        let attempts = self.attempts() + 1;
        let next = match err.category {
            ErrorCategory::Network => RecoveryState::RecoveringNetwork { attempts },
            ErrorCategory::Media => RecoveryState::RecoveringMedia { attempts },
            ErrorCategory::Other => return (RecoveryState::Terminated, RecoveryAction::Terminate),
        };

        if !policy.allows(attempts) {
            return (RecoveryState::Terminated, RecoveryAction::Terminate);
        }

        let action = match next {
            RecoveryState::RecoveringNetwork { .. } => RecoveryAction::ReloadSource,
            _ => RecoveryAction::RecoverMedia,
        };
        (next, action)
    }

    /// Buffered progress was made; any recovery in flight succeeded
    pub fn on_progress(self) -> RecoveryState {
        match self {
            RecoveryState::Terminated => RecoveryState::Terminated,
            _ => RecoveryState::Healthy,
        }
    }
}

impl std::fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryState::Healthy => write!(f, "healthy"),
            RecoveryState::RecoveringNetwork { attempts } => write!(f, "recovering_network({})", attempts),
            RecoveryState::RecoveringMedia { attempts } => write!(f, "recovering_media({})", attempts),
            RecoveryState::Terminated => write!(f, "terminated"),
        }
    }
}

/// What the supervisor asked the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    None,
    ReloadSource,
    RecoverMedia,
    Terminate,
}

/// Bound on consecutive recovery attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RecoveryPolicy {
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::bounded(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Applies the recovery policy to an engine
#[derive(Debug, Default)]
pub struct RecoverySupervisor {
    state: RecoveryState,
    policy: RecoveryPolicy,
}

impl RecoverySupervisor {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            state: RecoveryState::Healthy,
            policy,
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// Handle one engine error, issuing at most one call on the engine
    pub fn handle<E: StreamingEngine + ?Sized>(&mut self, engine: &mut E, err: &EngineError) -> RecoveryAction {
        if self.state.is_terminal() {
            debug!(details = %err.details, "Session terminated, ignoring engine error");
            return RecoveryAction::None;
        }
        if !err.fatal {
            debug!(category = %err.category, details = %err.details, "Non-fatal engine error");
            return RecoveryAction::None;
        }

        let (next, action) = self.state.transition(err, &self.policy);
        info!(from = %self.state, to = %next, "Recovery transition");
        self.state = next;

        match action {
            RecoveryAction::ReloadSource => {
                warn!(details = %err.details, attempts = next.attempts(), "Fatal network error encountered, trying to recover");
                engine.start_load();
            }
            RecoveryAction::RecoverMedia => {
                warn!(details = %err.details, attempts = next.attempts(), "Fatal media error encountered, trying to recover");
                engine.recover_media_error();
            }
            RecoveryAction::Terminate => {
                error!(category = %err.category, details = %err.details, "Fatal error, cannot recover");
                engine.destroy();
            }
            RecoveryAction::None => {}
        }

        action
    }

    /// Buffered progress was reported by the engine
    pub fn report_progress(&mut self) {
        let next = self.state.on_progress();
        if next != self.state {
            info!(from = %self.state, "Engine recovered");
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> EngineError {
        EngineError::fatal(ErrorCategory::Network, "manifestLoadError")
    }

    fn media() -> EngineError {
        EngineError::fatal(ErrorCategory::Media, "bufferAppendError")
    }

    #[test]
    fn test_non_fatal_is_ignored() {
        let err = EngineError::non_fatal(ErrorCategory::Network, "fragLoadTimeOut");
        let (state, action) = RecoveryState::Healthy.transition(&err, &RecoveryPolicy::default());
        assert_eq!(state, RecoveryState::Healthy);
        assert_eq!(action, RecoveryAction::None);
    }

    #[test]
    fn test_fatal_branches() {
        let policy = RecoveryPolicy::default();
        assert_eq!(
            RecoveryState::Healthy.transition(&network(), &policy),
            (RecoveryState::RecoveringNetwork { attempts: 1 }, RecoveryAction::ReloadSource)
        );
        assert_eq!(
            RecoveryState::Healthy.transition(&media(), &policy),
            (RecoveryState::RecoveringMedia { attempts: 1 }, RecoveryAction::RecoverMedia)
        );
        let other = EngineError::fatal(ErrorCategory::Other, "keySystemNoKeys");
        assert_eq!(
            RecoveryState::Healthy.transition(&other, &policy),
            (RecoveryState::Terminated, RecoveryAction::Terminate)
        );
    }

    #[test]
    fn test_terminated_absorbs_everything() {
        let policy = RecoveryPolicy::unbounded();
        for err in [network(), media()] {
            assert_eq!(
                RecoveryState::Terminated.transition(&err, &policy),
                (RecoveryState::Terminated, RecoveryAction::None)
            );
        }
        assert_eq!(RecoveryState::Terminated.on_progress(), RecoveryState::Terminated);
    }

    #[test]
    fn test_attempts_accumulate_across_categories() {
        let policy = RecoveryPolicy::bounded(3);
        let (s, _) = RecoveryState::Healthy.transition(&network(), &policy);
        let (s, _) = s.transition(&media(), &policy);
        let (s, a) = s.transition(&network(), &policy);
        assert_eq!(s, RecoveryState::RecoveringNetwork { attempts: 3 });
        assert_eq!(a, RecoveryAction::ReloadSource);

        let (s, a) = s.transition(&network(), &policy);
        assert_eq!(s, RecoveryState::Terminated);
        assert_eq!(a, RecoveryAction::Terminate);
    }

    #[test]
    fn test_progress_resets_attempts() {
        let policy = RecoveryPolicy::bounded(1);
        let (s, _) = RecoveryState::Healthy.transition(&network(), &policy);
        let s = s.on_progress();
        assert_eq!(s, RecoveryState::Healthy);
        let (s, a) = s.transition(&network(), &policy);
        assert_eq!(s, RecoveryState::RecoveringNetwork { attempts: 1 });
        assert_eq!(a, RecoveryAction::ReloadSource);
    }

    #[test]
    fn test_unbounded_never_gives_up() {
        let policy = RecoveryPolicy::unbounded();
        let mut state = RecoveryState::Healthy;
        for _ in 0..50 {
            let (next, action) = state.transition(&media(), &policy);
            assert_eq!(action, RecoveryAction::RecoverMedia);
            state = next;
        }
        assert_eq!(state.attempts(), 50);
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: RecoveryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RecoveryPolicy::default());
        let policy: RecoveryPolicy = serde_json::from_str(r#"{"max_attempts":null}"#).unwrap();
        assert_eq!(policy, RecoveryPolicy::unbounded());
    }
}
