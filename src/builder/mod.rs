//! Builder API for ergonomic definition construction.
//!
//! This module provides fluent builders and a macro for declaring transition
//! tables with minimal boilerplate.

pub mod definition;
pub mod error;
pub mod macros;
pub mod transition;

pub use definition::DefinitionBuilder;
pub use error::BuildError;
pub use transition::TransitionBuilder;
