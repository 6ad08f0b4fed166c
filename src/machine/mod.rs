//! Machine instances over a shared definition.
//!
//! A [`StateMachine`] holds the current state of one entity. Firing a
//! transition walks a fixed sequence: resolve the destination, evaluate the
//! rule, run before listeners (which may cancel), commit, run state-entry
//! listeners, then run after listeners.

mod definition;
#[allow(clippy::module_inception)]
mod machine;
mod outcome;

pub use definition::MachineDefinition;
pub use machine::StateMachine;
pub use outcome::{FireOutcome, TransitionFailure};
