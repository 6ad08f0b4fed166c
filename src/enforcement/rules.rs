//! Enforcement rules for machine definitions using Validation.

use crate::dispatch::{operation_suffix, CORE_OPERATIONS};
use crate::enforcement::violations::{DefinitionViolation, ViolationStrategy};
use crate::machine::MachineDefinition;
use std::collections::BTreeMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Type alias for validation check functions
pub type ValidationCheck = Box<
    dyn Fn(&MachineDefinition) -> Validation<(), NonEmptyVec<DefinitionViolation>> + Send + Sync,
>;

/// Enforcement rules for machine definitions.
/// Uses Validation to accumulate ALL violations.
pub struct EnforcementRules {
    pub(crate) rule_targets: bool,
    pub(crate) initial_state: bool,
    pub(crate) empty_transitions: bool,
    pub(crate) operation_names: bool,
    pub(crate) required_checks: Vec<ValidationCheck>,
    pub(crate) on_violation: ViolationStrategy,
}

impl EnforcementRules {
    /// Every built-in check, rejecting on violation.
    pub fn strict() -> Self {
        Self {
            rule_targets: true,
            initial_state: true,
            empty_transitions: true,
            operation_names: true,
            required_checks: Vec::new(),
            on_violation: ViolationStrategy::Reject,
        }
    }

    /// Enforce all rules, accumulating ALL violations.
    pub fn enforce(
        &self,
        definition: &MachineDefinition,
    ) -> Validation<(), NonEmptyVec<DefinitionViolation>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<DefinitionViolation>>> = Vec::new();

        if self.rule_targets {
            for (transition, _) in definition.rules().iter() {
                if !definition.table().is_known_transition(transition) {
                    checks.push(Validation::fail(
                        DefinitionViolation::RuleForUnknownTransition {
                            transition: transition.to_string(),
                        },
                    ));
                }
            }
        }

        if self.initial_state {
            if let Some(initial) = definition.initial_state() {
                if !definition.table().mentions_state(initial) {
                    checks.push(Validation::fail(
                        DefinitionViolation::InitialStateUnmentioned {
                            state: initial.to_string(),
                        },
                    ));
                }
            }
        }

        if self.empty_transitions {
            for transition in definition.table().transitions() {
                if transition.is_empty() {
                    checks.push(Validation::fail(DefinitionViolation::EmptyTransition {
                        transition: transition.name().to_string(),
                    }));
                }
            }
        }

        if self.operation_names {
            checks.extend(operation_name_collisions(definition));
        }

        for check_fn in &self.required_checks {
            checks.push(check_fn(definition));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Enforce and apply the violation strategy.
    ///
    /// Under [`ViolationStrategy::IgnoreAndLog`] violations are logged and the
    /// definition is accepted.
    pub fn apply(
        &self,
        definition: &MachineDefinition,
    ) -> Result<(), NonEmptyVec<DefinitionViolation>> {
        match self.enforce(definition) {
            Validation::Success(()) => Ok(()),
            Validation::Failure(violations) => match self.on_violation {
                ViolationStrategy::Reject => Err(violations),
                ViolationStrategy::IgnoreAndLog => {
                    for violation in violations.iter() {
                        tracing::warn!(%violation, "definition violation ignored");
                    }
                    Ok(())
                }
            },
        }
    }

    pub fn violation_strategy(&self) -> ViolationStrategy {
        self.on_violation
    }
}

impl Default for EnforcementRules {
    fn default() -> Self {
        Self::strict()
    }
}

/// Derived operation names claimed by more than one source.
fn operation_name_collisions(
    definition: &MachineDefinition,
) -> Vec<Validation<(), NonEmptyVec<DefinitionViolation>>> {
    let mut claimed: BTreeMap<String, String> = CORE_OPERATIONS
        .iter()
        .map(|name| (name.to_string(), "a core operation".to_string()))
        .collect();
    let mut candidates = Vec::new();

    for state in definition.states() {
        let suffix = operation_suffix(state.as_str());
        let source = format!("state '{state}'");
        candidates.push((format!("is_{suffix}"), source.clone()));
        candidates.push((format!("when_{suffix}"), source));
    }
    for transition in definition.table().names() {
        let suffix = operation_suffix(transition);
        let source = format!("transition '{transition}'");
        candidates.push((format!("can_{suffix}"), source.clone()));
        candidates.push((format!("on_{suffix}"), source.clone()));
        candidates.push((suffix, source));
    }

    let mut collisions = Vec::new();
    for (name, source) in candidates {
        match claimed.get(&name) {
            Some(first) => collisions.push(Validation::fail(
                DefinitionViolation::OperationNameCollision {
                    name,
                    first: first.clone(),
                    second: source,
                },
            )),
            None => {
                claimed.insert(name, source);
            }
        }
    }
    collisions
}
