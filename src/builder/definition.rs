//! Builder for constructing machine definitions.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Rule, RuleSet, State, TransitionTable};
use crate::machine::MachineDefinition;
use std::collections::HashSet;

/// Builder for [`MachineDefinition`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use turnstile::builder::DefinitionBuilder;
/// use turnstile::core::Rule;
///
/// let definition = DefinitionBuilder::new()
///     .initial("parked")
///     .transition("ignite", [("parked", "idling")])
///     .transition("turn_off", [("*", "parked")])
///     .rule("ignite", Rule::roles(["driver"]).depends("has_key"))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.initial_state().unwrap(), "parked");
/// assert!(definition.table().is_known_transition("turn_off"));
/// assert!(definition.rules().get("ignite").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DefinitionBuilder {
    initial: Option<State>,
    transitions: Vec<TransitionBuilder>,
    rules: RuleSet,
}

impl DefinitionBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default initial state for new instances.
    pub fn initial(mut self, state: impl Into<State>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Add a transition from `(source, destination)` pairs.
    pub fn transition<I, F, T>(mut self, name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<State>,
        T: Into<State>,
    {
        let transition = entries
            .into_iter()
            .fold(TransitionBuilder::new(name), |builder, (from, to)| {
                builder.entry(from, to)
            });
        self.transitions.push(transition);
        self
    }

    /// Add a transition built separately.
    pub fn add_transition(mut self, transition: TransitionBuilder) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Guard `transition` with `rule`.
    pub fn rule(mut self, transition: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(transition, rule);
        self
    }

    /// Add every rule of `rules`, replacing rules for the same transitions.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        for (transition, rule) in rules.iter() {
            self.rules.insert(transition, rule.clone());
        }
        self
    }

    /// Build the definition.
    /// Returns an error if the transitions are missing or malformed.
    pub fn build(self) -> Result<MachineDefinition, BuildError> {
        if self.transitions.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        let mut seen = HashSet::new();
        let mut table = TransitionTable::new();
        for transition in self.transitions {
            if transition.name.is_empty() {
                return Err(BuildError::EmptyName);
            }
            if !seen.insert(transition.name.clone()) {
                return Err(BuildError::DuplicateTransition(transition.name));
            }
            for (from, to) in &transition.entries {
                if from.as_str().is_empty() || to.as_str().is_empty() {
                    return Err(BuildError::EmptyName);
                }
                if to.is_wildcard() {
                    return Err(BuildError::WildcardDestination(transition.name));
                }
            }
            table.insert(transition.name, transition.entries);
        }

        let mut definition = MachineDefinition::new(table).with_rules(self.rules);
        if let Some(initial) = self.initial {
            definition = definition.with_initial_state(initial);
        }
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_transitions() {
        let result = DefinitionBuilder::new().initial("parked").build();
        assert_eq!(result.unwrap_err(), BuildError::NoTransitions);
    }

    #[test]
    fn builder_rejects_duplicate_transitions() {
        let result = DefinitionBuilder::new()
            .transition("park", [("idling", "parked")])
            .transition("park", [("first_gear", "parked")])
            .build();

        assert_eq!(
            result.unwrap_err(),
            BuildError::DuplicateTransition("park".to_string())
        );
    }

    #[test]
    fn builder_rejects_wildcard_destination() {
        let result = DefinitionBuilder::new()
            .transition("scatter", [("parked", "*")])
            .build();

        assert_eq!(
            result.unwrap_err(),
            BuildError::WildcardDestination("scatter".to_string())
        );
    }

    #[test]
    fn builder_rejects_empty_names() {
        let result = DefinitionBuilder::new()
            .transition("", [("parked", "idling")])
            .build();
        assert_eq!(result.unwrap_err(), BuildError::EmptyName);

        let result = DefinitionBuilder::new()
            .transition("ignite", [("", "idling")])
            .build();
        assert_eq!(result.unwrap_err(), BuildError::EmptyName);
    }

    #[test]
    fn empty_transition_is_allowed() {
        let definition = DefinitionBuilder::new()
            .add_transition(TransitionBuilder::new("baz"))
            .build()
            .unwrap();

        assert!(definition.table().is_known_transition("baz"));
        assert!(definition.table().get("baz").unwrap().is_empty());
        assert!(definition.initial_state().is_none());
    }

    #[test]
    fn rules_merge_into_builder() {
        let definition = DefinitionBuilder::new()
            .transition("ignite", [("parked", "idling")])
            .rule("ignite", Rule::roles(["driver"]))
            .rules(RuleSet::new().with("hardwire", Rule::roles(["thief"])))
            .build()
            .unwrap();

        assert_eq!(definition.rules().len(), 2);
    }
}
