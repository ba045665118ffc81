use tracing::info;

use crate::error::LifecycleError;

/// Where a lifecycle run currently stands. Held in memory for one
/// invocation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Configuring,
    Starting,
    HealthChecking,
    Running,
    Degraded,
    Stopping,
    Stopped,
    ConfirmingDestroy,
    Destroying,
    Destroyed,
}

impl LifecycleState {
    /// States a run may legally move to from `self`.
    pub fn successors(self) -> &'static [LifecycleState] {
        use LifecycleState::*;
        match self {
            Uninitialized => &[Configuring, Stopping, ConfirmingDestroy],
            Configuring => &[Starting],
            Starting => &[HealthChecking, Degraded],
            HealthChecking => &[Running, Degraded],
            Stopping => &[Stopped],
            ConfirmingDestroy => &[Destroying, Uninitialized],
            Destroying => &[Destroyed],
            Running | Degraded | Stopped | Destroyed => &[],
        }
    }

    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Configuring => "configuring",
            LifecycleState::Starting => "starting",
            LifecycleState::HealthChecking => "health-checking",
            LifecycleState::Running => "running",
            LifecycleState::Degraded => "degraded",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::ConfirmingDestroy => "confirming-destroy",
            LifecycleState::Destroying => "destroying",
            LifecycleState::Destroyed => "destroyed",
        };
        write!(f, "{s}")
    }
}

/// Current state plus the path taken to reach it.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: LifecycleState,
    history: Vec<LifecycleState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            current: LifecycleState::Uninitialized,
            history: vec![LifecycleState::Uninitialized],
        }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> LifecycleState {
        self.current
    }

    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    pub fn advance(&mut self, next: LifecycleState) -> Result<(), LifecycleError> {
        if !self.current.can_transition_to(next) {
            return Err(LifecycleError::IllegalTransition {
                from: self.current,
                to: next,
            });
        }
        info!(from = %self.current, to = %next, "lifecycle transition");
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;
    use super::*;

    #[test]
    fn start_path_is_legal() {
        let mut sm = StateMachine::new();
        for next in [Configuring, Starting, HealthChecking, Running] {
            sm.advance(next).unwrap();
        }
        assert_eq!(sm.current(), Running);
        assert_eq!(
            sm.history(),
            &[Uninitialized, Configuring, Starting, HealthChecking, Running]
        );
    }

    #[test]
    fn compose_failure_skips_health_checks() {
        let mut sm = StateMachine::new();
        sm.advance(Configuring).unwrap();
        sm.advance(Starting).unwrap();
        sm.advance(Degraded).unwrap();
        assert!(sm.current().is_terminal());
    }

    #[test]
    fn aborted_confirmation_returns_to_uninitialized() {
        let mut sm = StateMachine::new();
        sm.advance(ConfirmingDestroy).unwrap();
        sm.advance(Uninitialized).unwrap();
        assert_eq!(sm.current(), Uninitialized);
    }

    #[test]
    fn skipping_confirmation_is_rejected() {
        let mut sm = StateMachine::new();
        let err = sm.advance(Destroying).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::IllegalTransition {
                from: Uninitialized,
                to: Destroying
            }
        ));
        assert_eq!(sm.current(), Uninitialized);
    }

    #[test]
    fn terminal_states() {
        for s in [Running, Degraded, Stopped, Destroyed] {
            assert!(s.is_terminal(), "{s} should be terminal");
        }
        assert!(!Stopping.is_terminal());
    }
}
