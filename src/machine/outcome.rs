//! Results of firing a transition.

use crate::core::{DenyReason, State};
use thiserror::Error;

/// Expected, routine reasons a transition did not happen.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionFailure {
    #[error("Transition '{transition}' is not possible from state '{state}'")]
    NotPossible { transition: String, state: State },

    #[error("Transition '{transition}' denied: {reason}")]
    RuleDenied {
        transition: String,
        reason: DenyReason,
    },

    #[error("Transition '{transition}' was cancelled by a listener")]
    Cancelled { transition: String },
}

/// Result of a `fire` call that did not fault.
#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// State committed from `from` to `to`
    Transitioned {
        transition: String,
        from: State,
        to: State,
    },

    /// Nothing changed and no post-commit callbacks ran
    Failed(TransitionFailure),
}

impl FireOutcome {
    pub fn is_transitioned(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }

    pub fn failure(&self) -> Option<&TransitionFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Transitioned { .. } => None,
        }
    }

    /// Convert into a `Result` carrying the entered state.
    pub fn into_result(self) -> Result<State, TransitionFailure> {
        match self {
            Self::Transitioned { to, .. } => Ok(to),
            Self::Failed(failure) => Err(failure),
        }
    }
}

impl From<TransitionFailure> for FireOutcome {
    fn from(failure: TransitionFailure) -> Self {
        Self::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitioned_outcome_yields_new_state() {
        let outcome = FireOutcome::Transitioned {
            transition: "ignite".to_string(),
            from: "parked".into(),
            to: "idling".into(),
        };
        assert!(outcome.is_transitioned());
        assert!(outcome.failure().is_none());
        assert_eq!(outcome.into_result().unwrap(), "idling");
    }

    #[test]
    fn failure_messages_are_descriptive() {
        let failure = TransitionFailure::NotPossible {
            transition: "ignite".to_string(),
            state: "idling".into(),
        };
        assert_eq!(
            failure.to_string(),
            "Transition 'ignite' is not possible from state 'idling'"
        );

        let outcome = FireOutcome::from(failure.clone());
        assert_eq!(outcome.failure(), Some(&failure));
        assert_eq!(outcome.into_result().unwrap_err(), failure);
    }
}
