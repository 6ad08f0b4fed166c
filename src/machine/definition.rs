//! Per-entity-kind configuration shared by machine instances.

use crate::core::{RuleSet, State, TransitionTable};

/// Transition table, rules and default initial state of one entity kind.
///
/// Definitions are immutable once built and are shared between instances
/// through an `Arc`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MachineDefinition {
    pub(crate) table: TransitionTable,
    pub(crate) rules: RuleSet,
    pub(crate) initial_state: Option<State>,
}

impl MachineDefinition {
    pub fn new(table: TransitionTable) -> Self {
        Self {
            table,
            rules: RuleSet::new(),
            initial_state: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_initial_state(mut self, state: impl Into<State>) -> Self {
        self.initial_state = Some(state.into());
        self
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn initial_state(&self) -> Option<&State> {
        self.initial_state.as_ref()
    }

    /// Every state the definition knows: the table's states plus the initial
    /// state when the table never mentions it.
    pub fn states(&self) -> Vec<State> {
        let mut states: Vec<State> = self.table.states().into_iter().cloned().collect();
        if let Some(initial) = &self.initial_state {
            if !states.contains(initial) {
                states.push(initial.clone());
                states.sort();
            }
        }
        states
    }
}
