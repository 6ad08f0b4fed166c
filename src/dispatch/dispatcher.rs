//! Name-based access to a machine on behalf of a host value.

use super::operations::{AdHocMethod, Operation, OperationRegistry};
use crate::callbacks::{Control, EventKey, ListenerHandle, Phase, TransitionEvent};
use crate::core::{PredicateResolver, State};
use crate::error::MachineError;
use crate::machine::{FireOutcome, StateMachine};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Pairs a host value with its machine and answers derived operation names.
///
/// Every state `s` gets `is_s` and `when_s`; every transition `t` gets `t`
/// (fire), `can_t` and `on_t`. Ad hoc operations added with
/// [`add_method`](Self::add_method) share the same namespace and double as
/// predicates for rule dependencies.
///
/// # Example
///
/// ```rust
/// use serde_json::{json, Value};
/// use std::sync::Arc;
/// use turnstile::builder::DefinitionBuilder;
/// use turnstile::dispatch::CapabilityDispatcher;
/// use turnstile::machine::StateMachine;
///
/// struct Door {
///     label: &'static str,
/// }
///
/// let definition = DefinitionBuilder::new()
///     .initial("closed")
///     .transition("open", [("closed", "opened")])
///     .transition("close", [("opened", "closed")])
///     .build()
///     .unwrap();
/// let machine = StateMachine::new(Arc::new(definition)).unwrap();
/// let mut door = CapabilityDispatcher::new(Door { label: "front" }, machine);
///
/// assert_eq!(door.call("is_closed", &[]).unwrap(), json!(true));
/// assert_eq!(door.call("open", &[]).unwrap(), json!(true));
/// assert_eq!(door.call("is_opened", &[]).unwrap(), json!(true));
///
/// door.add_method("label", |door: &Door, _, _| Ok(Value::from(door.label)))
///     .unwrap();
/// assert_eq!(door.call("label", &[]).unwrap(), json!("front"));
/// ```
pub struct CapabilityDispatcher<H> {
    host: H,
    machine: StateMachine,
    operations: OperationRegistry<H>,
}

impl<H> CapabilityDispatcher<H> {
    pub fn new(host: H, machine: StateMachine) -> Self {
        let operations = OperationRegistry::derive(machine.definition());
        tracing::debug!(operations = operations.len(), "derived dispatcher operations");
        Self {
            host,
            machine,
            operations,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn into_parts(self) -> (H, StateMachine) {
        (self.host, self.machine)
    }

    pub fn current_state(&self) -> State {
        self.machine.current_state()
    }

    pub fn is(&self, state: &str) -> bool {
        self.machine.is(state)
    }

    /// Like [`StateMachine::can_fire`], with ad hoc operations available as
    /// rule dependencies.
    pub fn can(&self, transition: &str, role: Option<&str>) -> Result<bool, MachineError> {
        self.machine
            .can_fire_with(transition, role, &[&self.ad_hoc_predicates()])
    }

    /// Like [`StateMachine::fire`], with ad hoc operations available as rule
    /// dependencies.
    pub fn fire(&self, transition: &str, role: Option<&str>) -> Result<FireOutcome, MachineError> {
        self.machine
            .fire_with(transition, role, &[&self.ad_hoc_predicates()])
    }

    /// Run `callback` with the host if the machine is in `state`.
    ///
    /// Returns whether the callback ran. Nothing is deferred.
    pub fn when<F>(&self, state: &str, callback: F) -> bool
    where
        F: FnOnce(&H),
    {
        if !self.machine.is(state) {
            return false;
        }
        callback(&self.host);
        true
    }

    /// Register a listener using the string form of an event key.
    ///
    /// `target` is a transition name, a state name when `phase` is `"enter"`,
    /// or one of the wildcard targets `"transition"` and `"state"`.
    pub fn on<F>(
        &self,
        target: &str,
        phase: &str,
        listener: F,
        bubbles: bool,
    ) -> Result<ListenerHandle, MachineError>
    where
        F: Fn(&TransitionEvent) -> anyhow::Result<Control> + 'static,
    {
        let key = EventKey::parse(target, phase)?;
        Ok(self.machine.on(key, listener, bubbles))
    }

    /// Bind an ad hoc operation under `name`.
    ///
    /// Fails with [`MachineError::DuplicateOperation`] when the name is taken,
    /// leaving the existing binding in place.
    pub fn add_method<F>(&mut self, name: &str, method: F) -> Result<(), MachineError>
    where
        F: Fn(&H, &str, &[Value]) -> anyhow::Result<Value> + 'static,
    {
        let method: AdHocMethod<H> = Rc::new(method);
        self.operations.insert_ad_hoc(name, method)?;
        tracing::debug!(name, "added ad hoc operation");
        Ok(())
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains(name)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.names()
    }

    /// Invoke a value-shaped operation by name.
    ///
    /// `is_*`, `can_*` and fire operations answer with a boolean. `can_*` and
    /// fire operations take an optional role as their first argument. Ad hoc
    /// operations receive `args` untouched.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, MachineError> {
        let operation = self.operations.resolve(name)?;
        tracing::trace!(name, kind = operation.kind(), "dispatching operation");

        match operation {
            Operation::IsState(state) => Ok(Value::Bool(self.machine.is(state.as_str()))),
            Operation::CanFire(transition) => {
                let role = role_arg(name, args, 0)?;
                self.can(transition, role).map(Value::Bool)
            }
            Operation::Fire(transition) => {
                let role = role_arg(name, args, 0)?;
                let outcome = self.fire(transition, role)?;
                Ok(Value::Bool(outcome.is_transitioned()))
            }
            Operation::AdHoc(method) => {
                method(&self.host, name, args).map_err(|source| MachineError::Operation {
                    name: name.to_string(),
                    source,
                })
            }
            Operation::Core(core) => self.call_core(*core, args),
            Operation::WhenState(_) => Err(MachineError::OperationKindMismatch {
                name: name.to_string(),
                expected: "a callback; use when_named",
            }),
            Operation::OnTransition(_) => Err(MachineError::OperationKindMismatch {
                name: name.to_string(),
                expected: "a listener; use on_named",
            }),
        }
    }

    /// Invoke a `when_<state>` operation by name.
    pub fn when_named<F>(&self, name: &str, callback: F) -> Result<bool, MachineError>
    where
        F: FnOnce(&H),
    {
        match self.operations.resolve(name)? {
            Operation::WhenState(state) => Ok(self.when(state.as_str(), callback)),
            _ => Err(MachineError::OperationKindMismatch {
                name: name.to_string(),
                expected: "arguments; use call",
            }),
        }
    }

    /// Invoke an `on_<transition>` operation by name.
    ///
    /// `phase` is `"before"` or `"after"`.
    pub fn on_named<F>(
        &self,
        name: &str,
        phase: &str,
        listener: F,
        bubbles: bool,
    ) -> Result<ListenerHandle, MachineError>
    where
        F: Fn(&TransitionEvent) -> anyhow::Result<Control> + 'static,
    {
        match self.operations.resolve(name)? {
            Operation::OnTransition(transition) => {
                let phase = phase.parse::<Phase>()?;
                let key = EventKey::Transition {
                    name: transition.clone(),
                    phase,
                };
                Ok(self.machine.on(key, listener, bubbles))
            }
            _ => Err(MachineError::OperationKindMismatch {
                name: name.to_string(),
                expected: "arguments; use call",
            }),
        }
    }

    fn call_core(&self, core: &'static str, args: &[Value]) -> Result<Value, MachineError> {
        match core {
            "is" => {
                let state = string_arg(core, args, 0)?;
                Ok(Value::Bool(self.machine.is(state)))
            }
            "can" => {
                let transition = string_arg(core, args, 0)?;
                let role = role_arg(core, args, 1)?;
                self.can(transition, role).map(Value::Bool)
            }
            "fire" => {
                let transition = string_arg(core, args, 0)?;
                let role = role_arg(core, args, 1)?;
                Ok(Value::Bool(self.fire(transition, role)?.is_transitioned()))
            }
            "current_state" => Ok(Value::String(self.machine.current_state().into_inner())),
            _ => Err(MachineError::OperationKindMismatch {
                name: core.to_string(),
                expected: "a direct method call",
            }),
        }
    }

    fn ad_hoc_predicates(&self) -> AdHocPredicates<'_, H> {
        AdHocPredicates {
            host: &self.host,
            operations: &self.operations,
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for CapabilityDispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDispatcher")
            .field("host", &self.host)
            .field("machine", &self.machine)
            .field("operations", &self.operations.len())
            .finish()
    }
}

/// Exposes ad hoc operations to rule evaluation.
struct AdHocPredicates<'a, H> {
    host: &'a H,
    operations: &'a OperationRegistry<H>,
}

impl<H> PredicateResolver for AdHocPredicates<'_, H> {
    fn resolves(&self, name: &str) -> bool {
        matches!(self.operations.get(name), Some(Operation::AdHoc(_)))
    }

    fn evaluate(&self, name: &str, role: Option<&str>) -> anyhow::Result<bool> {
        let Some(Operation::AdHoc(method)) = self.operations.get(name) else {
            anyhow::bail!("'{name}' is not an ad hoc operation");
        };
        let arg = role.map_or(Value::Null, Value::from);
        Ok(is_truthy(&method(self.host, name, &[arg])?))
    }
}

/// Truthiness of an ad hoc result used as a predicate.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn string_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, MachineError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| MachineError::OperationKindMismatch {
            name: name.to_string(),
            expected: "a string argument",
        })
}

fn role_arg<'a>(
    name: &str,
    args: &'a [Value],
    index: usize,
) -> Result<Option<&'a str>, MachineError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(role)) => Ok(Some(role.as_str())),
        Some(_) => Err(MachineError::OperationKindMismatch {
            name: name.to_string(),
            expected: "a role string or null",
        }),
    }
}
