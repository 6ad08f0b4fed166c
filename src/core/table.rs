//! Declarative transition table.
//!
//! A table maps transition names to `source -> destination` entries. It is
//! configuration: built once per entity kind, then shared read-only by every
//! machine instance of that kind.

use super::state::State;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named transition and its `source -> destination` entries.
///
/// A transition with no entries is defined but never applicable.
///
/// # Example
///
/// ```rust
/// use turnstile::core::Transition;
///
/// let turn_off = Transition::new("turn_off", [("*", "parked")]);
///
/// assert_eq!(turn_off.destination_from(&"idling".into()).unwrap(), "parked");
/// assert_eq!(turn_off.destination_from(&"stalled".into()).unwrap(), "parked");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    name: String,
    entries: BTreeMap<State, State>,
}

impl Transition {
    pub fn new<I, F, T>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<State>,
        T: Into<State>,
    {
        Self {
            name: name.into(),
            entries: entries
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source/destination pairs in source order.
    pub fn entries(&self) -> impl Iterator<Item = (&State, &State)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the destination from `current`.
    ///
    /// The exact entry wins; otherwise the wildcard entry applies.
    pub fn destination_from(&self, current: &State) -> Option<&State> {
        self.entries
            .get(current)
            .or_else(|| self.entries.get(super::state::WILDCARD))
    }

    /// Destination of the wildcard entry, if declared.
    pub fn wildcard_destination(&self) -> Option<&State> {
        self.entries.get(super::state::WILDCARD)
    }
}

/// Mapping of transition name to [`Transition`].
///
/// # Example
///
/// ```rust
/// use turnstile::core::TransitionTable;
///
/// let mut table = TransitionTable::new();
/// table.insert("ignite", [("parked", "idling")]);
/// table.insert("park", [("idling", "parked")]);
///
/// assert_eq!(table.destination_for("ignite", &"parked".into()).unwrap(), "idling");
/// assert!(table.destination_for("ignite", &"idling".into()).is_none());
/// assert!(table.destination_for("fly", &"parked".into()).is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable {
    transitions: BTreeMap<String, Transition>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transition, returning the one it replaced.
    pub fn insert<I, F, T>(&mut self, name: impl Into<String>, entries: I) -> Option<Transition>
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<State>,
        T: Into<State>,
    {
        let transition = Transition::new(name, entries);
        self.transitions.insert(transition.name.clone(), transition)
    }

    pub fn get(&self, name: &str) -> Option<&Transition> {
        self.transitions.get(name)
    }

    /// Resolve where `transition` leads from `current`.
    ///
    /// Unknown transitions resolve to `None` rather than an error, which
    /// lets `can_fire` degrade to `false`.
    pub fn destination_for(&self, transition: &str, current: &State) -> Option<&State> {
        self.transitions
            .get(transition)
            .and_then(|t| t.destination_from(current))
    }

    pub fn is_known_transition(&self, name: &str) -> bool {
        self.transitions.contains_key(name)
    }

    /// Names of the transitions that resolve from `current`.
    pub fn possible_from(&self, current: &State) -> BTreeSet<&str> {
        self.transitions
            .values()
            .filter(|t| t.destination_from(current).is_some())
            .map(|t| t.name())
            .collect()
    }

    /// Every state the table mentions, as a source or a destination.
    ///
    /// The wildcard marker is not a state and is never included.
    pub fn states(&self) -> BTreeSet<&State> {
        self.transitions
            .values()
            .flat_map(|t| t.entries())
            .flat_map(|(from, to)| [from, to])
            .filter(|s| !s.is_wildcard())
            .collect()
    }

    pub fn mentions_state(&self, state: &State) -> bool {
        self.states().contains(state)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
