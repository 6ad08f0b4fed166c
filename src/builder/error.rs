//! Build errors for machine definitions.

use thiserror::Error;

/// Errors that can occur when building a machine definition.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("Transition '{0}' is defined more than once")]
    DuplicateTransition(String),

    #[error("Transition '{0}' uses the wildcard as a destination")]
    WildcardDestination(String),

    #[error("Transition and state names must not be empty")]
    EmptyName,
}
