//! Core state machine types and logic.
//!
//! This module contains the declarative, side-effect free part of the engine:
//! - Opaque `State` names
//! - The `TransitionTable` of named transitions
//! - `RuleSet` guards and the predicates they depend on
//! - History of committed transitions

mod history;
mod rules;
mod state;
mod table;

pub use history::{StateHistory, TransitionRecord};
pub use rules::{DenyReason, PredicateResolver, Predicates, Rule, RuleSet, Verdict};
pub use state::{State, WILDCARD};
pub use table::{Transition, TransitionTable};
