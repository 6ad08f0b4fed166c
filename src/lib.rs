//! Turnstile: a declarative finite state machine engine
//!
//! A machine is declared as data: a table of named transitions mapping source
//! states to destinations, plus optional rules restricting who may fire each
//! transition. Instances track the current state of one entity, run
//! callbacks around every transition and expose derived operations by name.
//!
//! # Core Concepts
//!
//! - **Transition table**: `name -> { source -> destination }`, with `*` as a
//!   wildcard source
//! - **Rules**: role membership plus an optional named predicate
//! - **Callbacks**: before/after listeners per transition and entry listeners
//!   per state, bubbling to a wildcard tier
//! - **Dispatch**: `is_<state>`, `can_<transition>`, `<transition>` and friends,
//!   resolved by name over a host value
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use turnstile::callbacks::{Control, EventKey};
//! use turnstile::core::{Predicates, Rule, RuleSet};
//! use turnstile::machine::{MachineDefinition, StateMachine};
//! use turnstile::transition_table;
//!
//! let table = transition_table! {
//!     ignite: { parked => idling, stalled => stalled },
//!     shift_up: { idling => first_gear },
//!     turn_off: { * => parked },
//! };
//! let rules = RuleSet::new().with("ignite", Rule::roles(["driver"]).depends("has_key"));
//! let definition = Arc::new(
//!     MachineDefinition::new(table)
//!         .with_rules(rules)
//!         .with_initial_state("parked"),
//! );
//!
//! let machine = StateMachine::new(definition)
//!     .unwrap()
//!     .with_resolver(Predicates::new().with("has_key", |role| role == Some("driver")));
//! machine.on(EventKey::enter("idling"), |event| {
//!     assert_eq!(event.from, "parked");
//!     Ok(Control::Continue)
//! }, true);
//!
//! assert!(!machine.fire("ignite", Some("thief")).unwrap().is_transitioned());
//! assert!(machine.fire("ignite", Some("driver")).unwrap().is_transitioned());
//! assert!(machine.is("idling"));
//! ```

pub mod builder;
pub mod callbacks;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod dot;
pub mod enforcement;
pub mod error;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, DefinitionBuilder};
pub use callbacks::{CallbackRegistry, Control, EventKey, Phase, TransitionEvent};
pub use config::ConfigError;
pub use core::{Rule, RuleSet, State, TransitionTable};
pub use dispatch::CapabilityDispatcher;
pub use error::MachineError;
pub use machine::{FireOutcome, MachineDefinition, StateMachine, TransitionFailure};
