//! Faults raised by the engine.
//!
//! Expected negative outcomes (a transition that is not possible, denied by a
//! rule or cancelled by a listener) are reported through
//! [`FireOutcome`](crate::machine::FireOutcome), never through this type.
//! `MachineError` is reserved for misuse of the API and for failures raised
//! by user code the engine calls into.

use thiserror::Error;

/// Errors that abort an engine call.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Unresolved operation '{name}'")]
    UnresolvedOperation { name: String },

    #[error("Operation '{name}' is already defined")]
    DuplicateOperation { name: String },

    #[error("Transition '{transition}' fired while transition '{in_flight}' is in flight")]
    ReentrantTransition {
        transition: String,
        in_flight: String,
    },

    #[error("Operation '{name}' expects {expected}")]
    OperationKindMismatch { name: String, expected: &'static str },

    #[error("Unknown callback phase '{0}' (expected before, after or enter)")]
    UnknownPhase(String),

    #[error("No initial state given and the definition declares none")]
    NoInitialState,

    #[error("Predicate '{name}' failed: {source}")]
    Predicate {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Operation '{name}' failed: {source}")]
    Operation {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Listener failed during '{transition}': {source}")]
    Listener {
        transition: String,
        #[source]
        source: anyhow::Error,
    },
}

impl MachineError {
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::UnresolvedOperation { name: name.into() }
    }

    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateOperation { name: name.into() }
    }

    /// Check if the error signals misuse of the operation registry.
    pub fn is_operation_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedOperation { .. }
                | Self::DuplicateOperation { .. }
                | Self::OperationKindMismatch { .. }
        )
    }
}
