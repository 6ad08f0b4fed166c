//! Machine instance driving guarded transitions and their callbacks.

use super::definition::MachineDefinition;
use super::outcome::{FireOutcome, TransitionFailure};
use crate::callbacks::{
    CallbackRegistry, Control, EventKey, ListenerHandle, Stage, TransitionEvent,
};
use crate::checkpoint::{CheckpointError, MachineSnapshot};
use crate::core::{PredicateResolver, State, StateHistory, TransitionRecord, Verdict};
use crate::error::MachineError;
use chrono::Utc;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// Current state of one entity plus the shared definition that governs it.
///
/// Methods take `&self` so listeners holding a handle to the machine can
/// inspect it mid-transition. The machine is not `Sync`; callers sharing it
/// across threads must provide their own locking. Firing again from inside a
/// listener fails with [`MachineError::ReentrantTransition`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use turnstile::machine::{MachineDefinition, StateMachine};
/// use turnstile::transition_table;
///
/// let table = transition_table! {
///     ignite: { parked => idling },
///     park: { idling => parked },
/// };
/// let definition = Arc::new(MachineDefinition::new(table).with_initial_state("parked"));
/// let machine = StateMachine::new(definition).unwrap();
///
/// assert!(machine.can_fire("ignite", None).unwrap());
/// assert!(machine.fire("ignite", None).unwrap().is_transitioned());
/// assert_eq!(machine.current_state(), "idling");
/// assert!(!machine.fire("ignite", None).unwrap().is_transitioned());
/// ```
pub struct StateMachine {
    definition: Arc<MachineDefinition>,
    current: RefCell<State>,
    callbacks: RefCell<CallbackRegistry>,
    history: RefCell<StateHistory>,
    resolver: Option<Box<dyn PredicateResolver>>,
    in_flight: RefCell<Option<String>>,
}

impl StateMachine {
    /// Create a machine in the definition's initial state.
    pub fn new(definition: Arc<MachineDefinition>) -> Result<Self, MachineError> {
        let initial = definition
            .initial_state()
            .cloned()
            .ok_or(MachineError::NoInitialState)?;
        Ok(Self::at(definition, initial))
    }

    /// Create a machine in a state the host loaded from its own store.
    pub fn at(definition: Arc<MachineDefinition>, state: impl Into<State>) -> Self {
        Self {
            definition,
            current: RefCell::new(state.into()),
            callbacks: RefCell::new(CallbackRegistry::new()),
            history: RefCell::new(StateHistory::new()),
            resolver: None,
            in_flight: RefCell::new(None),
        }
    }

    /// Rebuild a machine from a snapshot.
    pub fn restore(
        definition: Arc<MachineDefinition>,
        snapshot: MachineSnapshot,
    ) -> Result<Self, CheckpointError> {
        snapshot.check_version()?;
        let machine = Self::at(definition, snapshot.current_state);
        *machine.history.borrow_mut() = snapshot.history;
        Ok(machine)
    }

    /// Set the resolver consulted for rule `depends` predicates.
    pub fn with_resolver(mut self, resolver: impl PredicateResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Seed the listeners from a registry shared by the entity kind.
    pub fn with_callbacks(self, callbacks: CallbackRegistry) -> Self {
        *self.callbacks.borrow_mut() = callbacks;
        self
    }

    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.definition
    }

    pub fn current_state(&self) -> State {
        self.current.borrow().clone()
    }

    /// Check whether the machine is in `state`.
    pub fn is(&self, state: &str) -> bool {
        *self.current.borrow() == *state
    }

    /// Where `transition` would lead from the current state.
    pub fn destination(&self, transition: &str) -> Option<State> {
        self.definition
            .table
            .destination_for(transition, &self.current.borrow())
            .cloned()
    }

    /// Transitions whose table entries resolve from the current state.
    ///
    /// Rules are not evaluated.
    pub fn possible_transitions(&self) -> Vec<String> {
        self.definition
            .table
            .possible_from(&self.current.borrow())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Copy of the committed transitions so far.
    ///
    /// Owned, so callers may keep it across later `fire` calls.
    pub fn history(&self) -> StateHistory {
        self.history.borrow().clone()
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot::new(self.current_state(), self.history.borrow().clone())
    }

    /// Check whether `transition` could fire now for `role`.
    ///
    /// Read-only: never mutates state and never runs listeners.
    pub fn can_fire(&self, transition: &str, role: Option<&str>) -> Result<bool, MachineError> {
        self.can_fire_with(transition, role, &[])
    }

    /// Fire `transition` for `role`.
    ///
    /// Expected refusals come back as [`FireOutcome::Failed`]; only misuse
    /// and listener or predicate errors are returned as `Err`.
    pub fn fire(&self, transition: &str, role: Option<&str>) -> Result<FireOutcome, MachineError> {
        self.fire_with(transition, role, &[])
    }

    pub fn on<F>(&self, key: EventKey, listener: F, bubbles: bool) -> ListenerHandle
    where
        F: Fn(&TransitionEvent) -> anyhow::Result<Control> + 'static,
    {
        self.callbacks.borrow_mut().register(key, listener, bubbles)
    }

    pub fn unregister(&self, handle: &ListenerHandle) -> bool {
        self.callbacks.borrow_mut().unregister(handle)
    }

    pub fn is_firing(&self) -> bool {
        self.in_flight.borrow().is_some()
    }

    pub(crate) fn can_fire_with(
        &self,
        transition: &str,
        role: Option<&str>,
        extra: &[&dyn PredicateResolver],
    ) -> Result<bool, MachineError> {
        if self.destination(transition).is_none() {
            return Ok(false);
        }
        Ok(self.evaluate_rule(transition, role, extra)?.is_allowed())
    }

    pub(crate) fn fire_with(
        &self,
        transition: &str,
        role: Option<&str>,
        extra: &[&dyn PredicateResolver],
    ) -> Result<FireOutcome, MachineError> {
        let _flight = self.begin_flight(transition)?;
        let from = self.current_state();

        let Some(to) = self.destination(transition) else {
            tracing::debug!(transition, state = %from, "transition not possible");
            return Ok(TransitionFailure::NotPossible {
                transition: transition.to_string(),
                state: from,
            }
            .into());
        };

        if let Verdict::Denied(reason) = self.evaluate_rule(transition, role, extra)? {
            tracing::debug!(transition, role, %reason, "transition denied");
            return Ok(TransitionFailure::RuleDenied {
                transition: transition.to_string(),
                reason,
            }
            .into());
        }

        let mut event = TransitionEvent {
            transition: transition.to_string(),
            from: from.clone(),
            to: to.clone(),
            role: role.map(str::to_string),
            stage: Stage::Before,
        };

        let before = self.callbacks.borrow().plan(&EventKey::before(transition));
        if before.run(&event)? == Control::Cancel {
            tracing::debug!(transition, state = %from, "transition cancelled by listener");
            return Ok(TransitionFailure::Cancelled {
                transition: transition.to_string(),
            }
            .into());
        }

        *self.current.borrow_mut() = to.clone();
        self.history.borrow_mut().push(TransitionRecord {
            transition: transition.to_string(),
            from: from.clone(),
            to: to.clone(),
            role: event.role.clone(),
            timestamp: Utc::now(),
        });
        tracing::debug!(transition, from = %from, to = %to, "transition committed");

        event.stage = Stage::Enter;
        let enter = self.callbacks.borrow().plan(&EventKey::Enter(to.clone()));
        if !enter.is_empty() {
            enter.run(&event)?;
        }

        event.stage = Stage::After;
        let after = self.callbacks.borrow().plan(&EventKey::after(transition));
        after.run(&event)?;

        Ok(FireOutcome::Transitioned {
            transition: transition.to_string(),
            from,
            to,
        })
    }

    fn evaluate_rule(
        &self,
        transition: &str,
        role: Option<&str>,
        extra: &[&dyn PredicateResolver],
    ) -> Result<Verdict, MachineError> {
        let mut resolvers: Vec<&dyn PredicateResolver> = extra.to_vec();
        if let Some(resolver) = &self.resolver {
            resolvers.push(resolver.as_ref());
        }
        self.definition.rules.evaluate(transition, role, &resolvers)
    }

    fn begin_flight(&self, transition: &str) -> Result<Flight<'_>, MachineError> {
        let mut slot = self.in_flight.borrow_mut();
        if let Some(in_flight) = slot.as_ref() {
            return Err(MachineError::ReentrantTransition {
                transition: transition.to_string(),
                in_flight: in_flight.clone(),
            });
        }
        *slot = Some(transition.to_string());
        Ok(Flight {
            slot: &self.in_flight,
        })
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &*self.current.borrow())
            .field("transitions", &self.definition.table.len())
            .field("callbacks", &*self.callbacks.borrow())
            .field("history", &self.history.borrow().len())
            .finish()
    }
}

/// Marks a transition as in flight until dropped, including on early return
/// or unwinding out of a listener.
struct Flight<'a> {
    slot: &'a RefCell<Option<String>>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.slot.borrow_mut().take();
    }
}
