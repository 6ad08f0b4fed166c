//! Builder API for creating enforcement rules.

use crate::enforcement::rules::{EnforcementRules, ValidationCheck};
use crate::enforcement::violations::{DefinitionViolation, ViolationStrategy};
use crate::machine::MachineDefinition;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for creating enforcement rules.
///
/// Starts from every built-in check enabled.
pub struct EnforcementBuilder {
    rules: EnforcementRules,
}

impl EnforcementBuilder {
    pub fn new() -> Self {
        Self {
            rules: EnforcementRules::strict(),
        }
    }

    /// Allow rules for transitions the table does not define
    pub fn allow_unknown_rule_targets(mut self) -> Self {
        self.rules.rule_targets = false;
        self
    }

    /// Allow an initial state the table never mentions
    pub fn allow_unmentioned_initial_state(mut self) -> Self {
        self.rules.initial_state = false;
        self
    }

    /// Allow transitions with no entries
    pub fn allow_empty_transitions(mut self) -> Self {
        self.rules.empty_transitions = false;
        self
    }

    /// Allow derived operation names to collide
    pub fn allow_operation_collisions(mut self) -> Self {
        self.rules.operation_names = false;
        self
    }

    /// Add a custom validation check
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&MachineDefinition) -> Validation<(), NonEmptyVec<DefinitionViolation>>
            + Send
            + Sync
            + 'static,
    {
        self.rules.required_checks.push(Box::new(check));
        self
    }

    /// Add a simple predicate check with error message
    pub fn require_pred<F>(mut self, predicate: F, error_msg: String) -> Self
    where
        F: Fn(&MachineDefinition) -> bool + Send + Sync + 'static,
    {
        let check: ValidationCheck = Box::new(move |definition: &MachineDefinition| {
            if predicate(definition) {
                Validation::success(())
            } else {
                Validation::fail(DefinitionViolation::CustomCheckFailed {
                    message: error_msg.clone(),
                })
            }
        });
        self.rules.required_checks.push(check);
        self
    }

    /// Set violation handling strategy
    pub fn on_violation(mut self, strategy: ViolationStrategy) -> Self {
        self.rules.on_violation = strategy;
        self
    }

    /// Build the enforcement rules
    pub fn build(self) -> EnforcementRules {
        self.rules
    }
}

impl Default for EnforcementBuilder {
    fn default() -> Self {
        Self::new()
    }
}
