//! Registry of named operations derived from a definition.

use crate::core::State;
use crate::error::MachineError;
use crate::machine::MachineDefinition;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Ad hoc operation: receives the host, the name it was called by and the
/// call arguments.
pub type AdHocMethod<H> = Rc<dyn Fn(&H, &str, &[Value]) -> anyhow::Result<Value>>;

/// Names every dispatcher answers to regardless of the definition.
pub const CORE_OPERATIONS: [&str; 8] = [
    "is",
    "can",
    "when",
    "on",
    "fire",
    "call",
    "add_method",
    "current_state",
];

/// What a resolved operation name does.
pub enum Operation<H> {
    /// One of [`CORE_OPERATIONS`]
    Core(&'static str),
    /// `is_<state>`
    IsState(State),
    /// `can_<transition>`
    CanFire(String),
    /// `<transition>`
    Fire(String),
    /// `when_<state>`
    WhenState(State),
    /// `on_<transition>`
    OnTransition(String),
    /// Registered with `add_method`
    AdHoc(AdHocMethod<H>),
}

impl<H> Operation<H> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Core(_) => "core",
            Self::IsState(_) => "is",
            Self::CanFire(_) => "can",
            Self::Fire(_) => "fire",
            Self::WhenState(_) => "when",
            Self::OnTransition(_) => "on",
            Self::AdHoc(_) => "ad hoc",
        }
    }
}

impl<H> Clone for Operation<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Core(name) => Self::Core(*name),
            Self::IsState(state) => Self::IsState(state.clone()),
            Self::CanFire(t) => Self::CanFire(t.clone()),
            Self::Fire(t) => Self::Fire(t.clone()),
            Self::WhenState(state) => Self::WhenState(state.clone()),
            Self::OnTransition(t) => Self::OnTransition(t.clone()),
            Self::AdHoc(method) => Self::AdHoc(Rc::clone(method)),
        }
    }
}

impl<H> fmt::Debug for Operation<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(name) => write!(f, "Core({name})"),
            Self::IsState(state) => write!(f, "IsState({state})"),
            Self::CanFire(t) => write!(f, "CanFire({t})"),
            Self::Fire(t) => write!(f, "Fire({t})"),
            Self::WhenState(state) => write!(f, "WhenState({state})"),
            Self::OnTransition(t) => write!(f, "OnTransition({t})"),
            Self::AdHoc(_) => f.write_str("AdHoc"),
        }
    }
}

/// Operation names resolved through one lookup.
pub struct OperationRegistry<H> {
    operations: BTreeMap<String, Operation<H>>,
}

impl<H> OperationRegistry<H> {
    /// Populate the registry from a definition's states and transitions.
    ///
    /// When two derived names collide the first one wins.
    pub fn derive(definition: &MachineDefinition) -> Self {
        let mut registry = Self {
            operations: BTreeMap::new(),
        };

        for name in CORE_OPERATIONS {
            registry.derive_one(name.to_string(), Operation::Core(name));
        }
        for state in definition.states() {
            let suffix = operation_suffix(state.as_str());
            registry.derive_one(format!("is_{suffix}"), Operation::IsState(state.clone()));
            registry.derive_one(format!("when_{suffix}"), Operation::WhenState(state));
        }
        for transition in definition.table().names() {
            let suffix = operation_suffix(transition);
            registry.derive_one(suffix.clone(), Operation::Fire(transition.to_string()));
            registry.derive_one(
                format!("can_{suffix}"),
                Operation::CanFire(transition.to_string()),
            );
            registry.derive_one(
                format!("on_{suffix}"),
                Operation::OnTransition(transition.to_string()),
            );
        }

        registry
    }

    fn derive_one(&mut self, name: String, operation: Operation<H>) {
        if let Some(existing) = self.operations.get(&name) {
            tracing::warn!(
                name,
                existing = existing.kind(),
                skipped = operation.kind(),
                "derived operation name collides; keeping the first"
            );
            return;
        }
        self.operations.insert(name, operation);
    }

    /// Register an ad hoc operation. Existing names are never overridden.
    pub fn insert_ad_hoc(
        &mut self,
        name: &str,
        method: AdHocMethod<H>,
    ) -> Result<(), MachineError> {
        if self.operations.contains_key(name) {
            return Err(MachineError::duplicate(name));
        }
        self.operations
            .insert(name.to_string(), Operation::AdHoc(method));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Operation<H>> {
        self.operations.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&Operation<H>, MachineError> {
        self.get(name).ok_or_else(|| MachineError::unresolved(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<H> fmt::Debug for OperationRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.operations.iter()).finish()
    }
}

/// Normalise a state or transition name into an operation-name suffix.
///
/// Lowercases, splits camelCase and maps anything that is not alphanumeric
/// to `_`.
///
/// # Example
///
/// ```rust
/// use turnstile::dispatch::operation_suffix;
///
/// assert_eq!(operation_suffix("first_gear"), "first_gear");
/// assert_eq!(operation_suffix("shiftUp"), "shift_up");
/// assert_eq!(operation_suffix("Turn Off"), "turn_off");
/// ```
pub fn operation_suffix(name: &str) -> String {
    let mut suffix = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if previous_lower {
                suffix.push('_');
            }
            suffix.extend(c.to_lowercase());
            previous_lower = false;
        } else if c.is_alphanumeric() {
            suffix.push(c);
            previous_lower = c.is_lowercase() || c.is_ascii_digit();
        } else {
            suffix.push('_');
            previous_lower = false;
        }
    }
    suffix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DefinitionBuilder;

    fn method<F>(f: F) -> AdHocMethod<()>
    where
        F: Fn(&(), &str, &[Value]) -> anyhow::Result<Value> + 'static,
    {
        Rc::new(f)
    }

    fn registry() -> OperationRegistry<()> {
        let definition = DefinitionBuilder::new()
            .initial("parked")
            .transition("ignite", [("parked", "idling")])
            .transition("shift_up", [("idling", "first_gear")])
            .build()
            .unwrap();
        OperationRegistry::derive(&definition)
    }

    #[test]
    fn derives_state_and_transition_operations() {
        let registry = registry();

        for name in [
            "is_parked",
            "is_idling",
            "is_first_gear",
            "when_first_gear",
            "ignite",
            "can_ignite",
            "on_ignite",
            "shift_up",
            "can_shift_up",
            "on_shift_up",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(matches!(
            registry.get("can_shift_up"),
            Some(Operation::CanFire(t)) if t == "shift_up"
        ));
    }

    #[test]
    fn core_operations_are_reserved() {
        let mut registry = registry();
        for name in CORE_OPERATIONS {
            assert!(matches!(registry.get(name), Some(Operation::Core(_))));
        }
        let result = registry.insert_ad_hoc("is", method(|_, _, _| Ok(Value::Null)));
        assert!(matches!(result, Err(MachineError::DuplicateOperation { .. })));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        let registry = registry();
        assert!(matches!(
            registry.resolve("is_foobar"),
            Err(MachineError::UnresolvedOperation { ref name }) if name == "is_foobar"
        ));
    }

    #[test]
    fn ad_hoc_names_cannot_be_redefined() {
        let mut registry = registry();
        registry
            .insert_ad_hoc("honk", method(|_, _, _| Ok(Value::from("beep"))))
            .unwrap();
        let result = registry.insert_ad_hoc("honk", method(|_, _, _| Ok(Value::from("toot"))));

        assert!(matches!(result, Err(MachineError::DuplicateOperation { .. })));
        assert!(matches!(registry.get("honk"), Some(Operation::AdHoc(_))));
    }

    #[test]
    fn colliding_derived_names_keep_first() {
        let definition = DefinitionBuilder::new()
            .transition("is_parked", [("idling", "parked")])
            .transition("park", [("idling", "parked")])
            .build()
            .unwrap();
        let registry: OperationRegistry<()> = OperationRegistry::derive(&definition);

        assert!(matches!(registry.get("is_parked"), Some(Operation::IsState(_))));
    }

    #[test]
    fn suffix_normalises_names() {
        assert_eq!(operation_suffix("parked"), "parked");
        assert_eq!(operation_suffix("secondGear"), "second_gear");
        assert_eq!(operation_suffix("gear-2"), "gear_2");
        assert_eq!(operation_suffix("HTTPReady"), "httpready");
    }
}
