//! Violation errors and handling strategies.

use thiserror::Error;

/// Problems found by a strict pass over a machine definition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionViolation {
    #[error("Rule targets unknown transition '{transition}'")]
    RuleForUnknownTransition { transition: String },

    #[error("Initial state '{state}' is never mentioned by the transition table")]
    InitialStateUnmentioned { state: String },

    #[error("Transition '{transition}' has no entries and can never fire")]
    EmptyTransition { transition: String },

    #[error("Operation name '{name}' is derived from both {first} and {second}")]
    OperationNameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Custom check failed: {message}")]
    CustomCheckFailed { message: String },
}

/// Strategy for handling definition violations
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ViolationStrategy {
    /// Refuse the definition
    #[default]
    Reject,

    /// Accept the definition but log a warning per violation
    IgnoreAndLog,
}
