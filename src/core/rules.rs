//! Role rules and dependency predicates guarding transitions.
//!
//! Rules are pure: evaluating one never mutates a machine and never fires
//! callbacks, so it is safe to call repeatedly for read-only inspection.

use crate::error::MachineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Guard attached to a single transition.
///
/// The role check is disjunctive: any one listed role satisfies it, and a
/// rule with no roles is open to everyone. The optional `depends`
/// predicate is combined with the role check by AND.
///
/// # Example
///
/// ```rust
/// use turnstile::core::Rule;
///
/// let rule = Rule::roles(["driver", "thief"]).depends("available_parking");
///
/// assert!(rule.permits_role("thief"));
/// assert!(!rule.permits_role("mechanic"));
/// assert_eq!(rule.dependency(), Some("available_parking"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depends: Option<String>,
}

impl Rule {
    /// A rule with no role restriction.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            depends: None,
        }
    }

    /// Additionally require the named predicate to hold for the caller's role.
    pub fn depends(mut self, predicate: impl Into<String>) -> Self {
        self.depends = Some(predicate.into());
        self
    }

    pub fn allowed_roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    pub fn dependency(&self) -> Option<&str> {
        self.depends.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn permits_role(&self, role: &str) -> bool {
        self.is_open() || self.roles.contains(role)
    }
}

/// Why a rule refused a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// The rule names roles and the caller supplied none.
    MissingRole { required: Vec<String> },
    /// The caller's role is not one the rule lists.
    RoleNotPermitted { role: String, allowed: Vec<String> },
    /// The role matched but the dependency predicate returned false.
    DependencyUnsatisfied {
        predicate: String,
        role: Option<String>,
    },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRole { required } => {
                write!(f, "a role is required (one of: {})", required.join(", "))
            }
            Self::RoleNotPermitted { role, allowed } => write!(
                f,
                "role '{role}' is not permitted (allowed: {})",
                allowed.join(", ")
            ),
            Self::DependencyUnsatisfied { predicate, role } => match role {
                Some(role) => write!(f, "predicate '{predicate}' rejected role '{role}'"),
                None => write!(f, "predicate '{predicate}' rejected the call"),
            },
        }
    }
}

/// Outcome of evaluating a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(DenyReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Source of named boolean predicates used by rule dependencies.
pub trait PredicateResolver {
    /// Whether this resolver knows `name`.
    fn resolves(&self, name: &str) -> bool;

    /// Evaluate `name` for `role`. Only called when `resolves(name)` holds.
    fn evaluate(&self, name: &str, role: Option<&str>) -> anyhow::Result<bool>;
}

type PredicateFn = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// Registry of predicate closures keyed by name.
///
/// # Example
///
/// ```rust
/// use turnstile::core::{PredicateResolver, Predicates};
///
/// let predicates = Predicates::new().with("has_key", |role| role == Some("driver"));
///
/// assert!(predicates.resolves("has_key"));
/// assert!(predicates.evaluate("has_key", Some("driver")).unwrap());
/// assert!(!predicates.evaluate("has_key", Some("thief")).unwrap());
/// ```
#[derive(Clone, Default)]
pub struct Predicates {
    predicates: HashMap<String, PredicateFn>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.insert(name, predicate);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for Predicates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("Predicates").field("names", &names).finish()
    }
}

impl PredicateResolver for Predicates {
    fn resolves(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    fn evaluate(&self, name: &str, role: Option<&str>) -> anyhow::Result<bool> {
        match self.predicates.get(name) {
            Some(predicate) => Ok(predicate(role)),
            None => anyhow::bail!("predicate '{name}' is not registered"),
        }
    }
}

/// Mapping of transition name to [`Rule`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transition: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.rules.insert(transition.into(), rule)
    }

    pub fn with(mut self, transition: impl Into<String>, rule: Rule) -> Self {
        self.insert(transition, rule);
        self
    }

    pub fn get(&self, transition: &str) -> Option<&Rule> {
        self.rules.get(transition)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate the rule guarding `transition` for `role`.
    ///
    /// Transitions without a rule are always allowed. Resolvers are tried in
    /// order; a `depends` predicate none of them knows is a fault, not a
    /// denial, even when the role check alone would already deny.
    ///
    /// # Example
    ///
    /// ```rust
    /// use turnstile::core::{PredicateResolver, Predicates, Rule, RuleSet};
    ///
    /// let rules = RuleSet::new().with("ignite", Rule::roles(["driver"]).depends("has_key"));
    /// let predicates = Predicates::new().with("has_key", |role| role == Some("driver"));
    /// let resolvers: [&dyn PredicateResolver; 1] = [&predicates];
    ///
    /// assert!(rules.evaluate("ignite", Some("driver"), &resolvers).unwrap().is_allowed());
    /// assert!(!rules.evaluate("ignite", Some("thief"), &resolvers).unwrap().is_allowed());
    /// assert!(!rules.evaluate("ignite", None, &resolvers).unwrap().is_allowed());
    /// assert!(rules.evaluate("park", None, &resolvers).unwrap().is_allowed());
    /// ```
    pub fn evaluate(
        &self,
        transition: &str,
        role: Option<&str>,
        resolvers: &[&dyn PredicateResolver],
    ) -> Result<Verdict, MachineError> {
        let Some(rule) = self.rules.get(transition) else {
            return Ok(Verdict::Allowed);
        };

        if !rule.is_open() {
            let allowed: Vec<String> = rule.roles.iter().cloned().collect();
            match role {
                None => {
                    if let Some(predicate) = rule.dependency() {
                        if !resolvers.iter().any(|r| r.resolves(predicate)) {
                            return Err(MachineError::UnresolvedOperation {
                                name: predicate.to_string(),
                            });
                        }
                    }
                    return Ok(Verdict::Denied(DenyReason::MissingRole { required: allowed }));
                }
                Some(role) if !rule.roles.contains(role) => {
                    return Ok(Verdict::Denied(DenyReason::RoleNotPermitted {
                        role: role.to_string(),
                        allowed,
                    }));
                }
                Some(_) => {}
            }
        }

        let Some(predicate) = rule.dependency() else {
            return Ok(Verdict::Allowed);
        };

        let resolver = resolvers
            .iter()
            .find(|r| r.resolves(predicate))
            .ok_or_else(|| MachineError::UnresolvedOperation {
                name: predicate.to_string(),
            })?;

        let satisfied =
            resolver
                .evaluate(predicate, role)
                .map_err(|source| MachineError::Predicate {
                    name: predicate.to_string(),
                    source,
                })?;

        if satisfied {
            Ok(Verdict::Allowed)
        } else {
            Ok(Verdict::Denied(DenyReason::DependencyUnsatisfied {
                predicate: predicate.to_string(),
                role: role.map(str::to_string),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle_rules() -> RuleSet {
        RuleSet::new()
            .with("hardwire", Rule::roles(["thief"]))
            .with("ignite", Rule::roles(["driver"]).depends("has_key"))
            .with(
                "park",
                Rule::roles(["driver", "thief"]).depends("available_parking"),
            )
            .with("inspect", Rule::open().depends("has_tools"))
    }

    fn vehicle_predicates() -> Predicates {
        Predicates::new()
            .with("has_key", |role| role == Some("driver"))
            .with("available_parking", |role| role == Some("thief"))
    }

    fn verdict(rules: &RuleSet, transition: &str, role: Option<&str>) -> Verdict {
        let predicates = vehicle_predicates();
        rules.evaluate(transition, role, &[&predicates]).unwrap()
    }

    #[test]
    fn unguarded_transition_is_always_allowed() {
        let rules = vehicle_rules();
        assert_eq!(verdict(&rules, "shift_up", None), Verdict::Allowed);
        assert_eq!(verdict(&rules, "shift_up", Some("anyone")), Verdict::Allowed);
    }

    #[test]
    fn role_match_is_disjunctive() {
        let rules = vehicle_rules();
        assert!(verdict(&rules, "hardwire", Some("thief")).is_allowed());
        assert!(!verdict(&rules, "hardwire", Some("driver")).is_allowed());
    }

    #[test]
    fn missing_role_is_denied() {
        let rules = vehicle_rules();
        assert_eq!(
            verdict(&rules, "hardwire", None),
            Verdict::Denied(DenyReason::MissingRole {
                required: vec!["thief".to_string()]
            })
        );
    }

    #[test]
    fn wrong_role_reports_allowed_roles() {
        let rules = vehicle_rules();
        assert_eq!(
            verdict(&rules, "park", Some("mechanic")),
            Verdict::Denied(DenyReason::RoleNotPermitted {
                role: "mechanic".to_string(),
                allowed: vec!["driver".to_string(), "thief".to_string()],
            })
        );
    }

    #[test]
    fn dependency_is_conjunctive_with_role() {
        let rules = vehicle_rules();
        assert!(verdict(&rules, "ignite", Some("driver")).is_allowed());
        assert!(verdict(&rules, "park", Some("thief")).is_allowed());
        assert_eq!(
            verdict(&rules, "park", Some("driver")),
            Verdict::Denied(DenyReason::DependencyUnsatisfied {
                predicate: "available_parking".to_string(),
                role: Some("driver".to_string()),
            })
        );
    }

    #[test]
    fn unresolved_dependency_is_a_fault() {
        let rules = vehicle_rules();
        let predicates = vehicle_predicates();
        let result = rules.evaluate("inspect", Some("mechanic"), &[&predicates]);

        assert!(matches!(
            result,
            Err(MachineError::UnresolvedOperation { ref name }) if name == "has_tools"
        ));
    }

    #[test]
    fn missing_role_with_unresolved_dependency_is_a_fault() {
        let rules = RuleSet::new().with("repair", Rule::roles(["mechanic"]).depends("has_tools"));
        let predicates = vehicle_predicates();

        let result = rules.evaluate("repair", None, &[&predicates]);
        assert!(matches!(
            result,
            Err(MachineError::UnresolvedOperation { ref name }) if name == "has_tools"
        ));

        let tools = Predicates::new().with("has_tools", |role| role == Some("mechanic"));
        assert_eq!(
            rules.evaluate("repair", None, &[&predicates, &tools]).unwrap(),
            Verdict::Denied(DenyReason::MissingRole {
                required: vec!["mechanic".to_string()]
            })
        );
    }

    #[test]
    fn later_resolvers_are_consulted() {
        let rules = vehicle_rules();
        let predicates = vehicle_predicates();
        let tools = Predicates::new().with("has_tools", |role| role == Some("mechanic"));

        assert!(rules
            .evaluate("inspect", Some("mechanic"), &[&predicates, &tools])
            .unwrap()
            .is_allowed());
        assert!(!rules
            .evaluate("inspect", None, &[&predicates, &tools])
            .unwrap()
            .is_allowed());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let rules = vehicle_rules();
        let first = verdict(&rules, "ignite", Some("thief"));
        let second = verdict(&rules, "ignite", Some("thief"));
        assert_eq!(first, second);
    }

    #[test]
    fn deny_reason_describes_itself() {
        let reason = DenyReason::RoleNotPermitted {
            role: "thief".to_string(),
            allowed: vec!["driver".to_string()],
        };
        assert_eq!(
            reason.to_string(),
            "role 'thief' is not permitted (allowed: driver)"
        );
    }

    #[test]
    fn rule_set_round_trips_through_json() {
        let rules = vehicle_rules();
        let json = serde_json::to_string(&rules).unwrap();
        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(rules, back);
    }
}
