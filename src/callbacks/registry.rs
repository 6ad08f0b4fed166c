//! Listener registry with bubbling dispatch.

use super::event::{Control, EventKey, Stage, TransitionEvent};
use crate::core::State;
use crate::error::MachineError;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Listener invoked synchronously during a transition.
pub type Listener = Rc<dyn Fn(&TransitionEvent) -> anyhow::Result<Control>>;

/// Identifies one registration so it can be removed again.
///
/// Ids are unique across every registry in the process, so a handle never
/// matches a listener registered elsewhere. Registries cloned from a template
/// share the template's listeners, and a handle to one of those removes it
/// from whichever copy it is passed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    key: EventKey,
    id: u64,
}

impl ListenerHandle {
    pub fn key(&self) -> &EventKey {
        &self.key
    }
}

#[derive(Clone)]
struct Registration {
    id: u64,
    listener: Listener,
    bubbles: bool,
}

/// Ordered listeners per event key.
///
/// Cloning a registry shares the listeners, which lets one template registry
/// seed many machine instances.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use turnstile::callbacks::{CallbackRegistry, Control, EventKey, Phase, Stage, TransitionEvent};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let mut registry = CallbackRegistry::new();
///
/// let log = Rc::clone(&seen);
/// registry.register(EventKey::before("ignite"), move |_| {
///     log.borrow_mut().push("ignite");
///     Ok(Control::Continue)
/// }, false);
///
/// let log = Rc::clone(&seen);
/// registry.register(EventKey::AnyTransition(Phase::Before), move |_| {
///     log.borrow_mut().push("any");
///     Ok(Control::Continue)
/// }, true);
///
/// let event = TransitionEvent {
///     transition: "ignite".to_string(),
///     from: "parked".into(),
///     to: "idling".into(),
///     role: None,
///     stage: Stage::Before,
/// };
/// registry.fire_before(&event).unwrap();
///
/// // The non-bubbling listener kept the wildcard tier silent.
/// assert_eq!(*seen.borrow(), vec!["ignite"]);
/// ```
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    listeners: HashMap<EventKey, Vec<Registration>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `key`.
    ///
    /// A listener with `bubbles == false` stops the wildcard tier from running
    /// in the same dispatch.
    pub fn register<F>(&mut self, key: EventKey, listener: F, bubbles: bool) -> ListenerHandle
    where
        F: Fn(&TransitionEvent) -> anyhow::Result<Control> + 'static,
    {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(%key, id, bubbles, "registering listener");

        self.listeners.entry(key.clone()).or_default().push(Registration {
            id,
            listener: Rc::new(listener),
            bubbles,
        });

        ListenerHandle { key, id }
    }

    /// Remove a registration. Returns `false` if it was already gone.
    pub fn unregister(&mut self, handle: &ListenerHandle) -> bool {
        let Some(entries) = self.listeners.get_mut(&handle.key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|r| r.id != handle.id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.remove(&handle.key);
        }
        removed
    }

    pub fn listener_count(&self, key: &EventKey) -> usize {
        self.listeners.get(key).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Snapshot the listeners a dispatch on `key` would run.
    ///
    /// The plan owns its listeners, so running it does not borrow the
    /// registry and listeners may register more listeners meanwhile.
    pub fn plan(&self, key: &EventKey) -> DispatchPlan {
        let specific = self.listeners.get(key).cloned().unwrap_or_default();
        let wildcard = key
            .wildcard()
            .and_then(|k| self.listeners.get(&k).cloned())
            .unwrap_or_default();

        DispatchPlan { specific, wildcard }
    }

    pub fn fire_before(&self, event: &TransitionEvent) -> Result<Control, MachineError> {
        self.plan(&EventKey::before(event.transition.as_str())).run(event)
    }

    pub fn fire_after(&self, event: &TransitionEvent) -> Result<Control, MachineError> {
        self.plan(&EventKey::after(event.transition.as_str())).run(event)
    }

    pub fn fire_enter(
        &self,
        state: &State,
        event: &TransitionEvent,
    ) -> Result<Control, MachineError> {
        self.plan(&EventKey::Enter(state.clone())).run(event)
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .listeners
            .iter()
            .map(|(key, entries)| format!("{key}({})", entries.len()))
            .collect();
        keys.sort();
        f.debug_struct("CallbackRegistry")
            .field("listeners", &keys)
            .finish()
    }
}

/// Listeners selected for one dispatch, in registration order per tier.
pub struct DispatchPlan {
    specific: Vec<Registration>,
    wildcard: Vec<Registration>,
}

impl DispatchPlan {
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.wildcard.is_empty()
    }

    /// Run the plan against `event`.
    ///
    /// Specific listeners run first. The wildcard tier runs only if every
    /// specific listener bubbles, except for state entry which always reaches
    /// both tiers. A before-stage `Cancel` stops the dispatch at once; a
    /// listener error aborts the remaining listeners.
    pub fn run(self, event: &TransitionEvent) -> Result<Control, MachineError> {
        let mut bubbling = true;

        for entry in &self.specific {
            if invoke(entry, event)? == Control::Cancel {
                return Ok(Control::Cancel);
            }
            bubbling &= entry.bubbles;
        }

        if !bubbling && event.stage != Stage::Enter {
            tracing::trace!(
                transition = %event.transition,
                skipped = self.wildcard.len(),
                "propagation stopped by non-bubbling listener"
            );
            return Ok(Control::Continue);
        }

        for entry in &self.wildcard {
            if invoke(entry, event)? == Control::Cancel {
                return Ok(Control::Cancel);
            }
        }

        Ok(Control::Continue)
    }
}

fn invoke(entry: &Registration, event: &TransitionEvent) -> Result<Control, MachineError> {
    let control = (entry.listener)(event).map_err(|source| MachineError::Listener {
        transition: event.transition.clone(),
        source,
    })?;

    if control == Control::Cancel && event.stage != Stage::Before {
        tracing::warn!(
            transition = %event.transition,
            stage = ?event.stage,
            "listener requested cancellation after commit; ignored"
        );
        return Ok(Control::Continue);
    }

    Ok(control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::event::Phase;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn event(stage: Stage) -> TransitionEvent {
        TransitionEvent {
            transition: "ignite".to_string(),
            from: "parked".into(),
            to: "idling".into(),
            role: None,
            stage,
        }
    }

    fn recorder(
        log: &Log,
        label: &'static str,
    ) -> impl Fn(&TransitionEvent) -> anyhow::Result<Control> {
        let log = Rc::clone(log);
        move |_| {
            log.borrow_mut().push(label);
            Ok(Control::Continue)
        }
    }

    #[test]
    fn specific_listeners_run_before_wildcard_in_order() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::AnyTransition(Phase::Before), recorder(&log, "any"), true);
        registry.register(EventKey::before("ignite"), recorder(&log, "first"), true);
        registry.register(EventKey::before("ignite"), recorder(&log, "second"), true);

        registry.fire_before(&event(Stage::Before)).unwrap();

        assert_eq!(*log.borrow(), vec!["first", "second", "any"]);
    }

    #[test]
    fn non_bubbling_listener_stops_wildcard_tier_only() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::before("ignite"), recorder(&log, "l1"), false);
        registry.register(EventKey::before("ignite"), recorder(&log, "l2"), true);
        registry.register(EventKey::AnyTransition(Phase::Before), recorder(&log, "l3"), true);

        registry.fire_before(&event(Stage::Before)).unwrap();

        assert_eq!(*log.borrow(), vec!["l1", "l2"]);
    }

    #[test]
    fn other_transitions_do_not_trigger_listener() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::before("park"), recorder(&log, "park"), true);
        registry.register(EventKey::after("ignite"), recorder(&log, "after"), true);

        registry.fire_before(&event(Stage::Before)).unwrap();

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cancel_stops_dispatch_in_before_stage() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::before("ignite"), |_| Ok(Control::Cancel), true);
        registry.register(EventKey::before("ignite"), recorder(&log, "late"), true);

        let control = registry.fire_before(&event(Stage::Before)).unwrap();

        assert_eq!(control, Control::Cancel);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cancel_is_ignored_after_commit() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::after("ignite"), |_| Ok(Control::Cancel), true);
        registry.register(EventKey::after("ignite"), recorder(&log, "still runs"), true);

        let control = registry.fire_after(&event(Stage::After)).unwrap();

        assert_eq!(control, Control::Continue);
        assert_eq!(*log.borrow(), vec!["still runs"]);
    }

    #[test]
    fn enter_reaches_both_tiers_regardless_of_bubbling() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::enter("idling"), recorder(&log, "idling"), false);
        registry.register(EventKey::AnyEnter, recorder(&log, "any state"), true);
        registry.register(EventKey::enter("parked"), recorder(&log, "parked"), true);

        registry
            .fire_enter(&State::from("idling"), &event(Stage::Enter))
            .unwrap();

        assert_eq!(*log.borrow(), vec!["idling", "any state"]);
    }

    #[test]
    fn listener_error_aborts_remaining_listeners() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::before("ignite"), |_| anyhow::bail!("no fuel"), true);
        registry.register(EventKey::before("ignite"), recorder(&log, "skipped"), true);

        let err = registry.fire_before(&event(Stage::Before)).unwrap_err();

        assert!(matches!(
            err,
            MachineError::Listener { ref transition, .. } if transition == "ignite"
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn error_after_non_bubbling_listener_skips_wildcard_tier() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKey::before("ignite"), recorder(&log, "blocker"), false);
        registry.register(EventKey::before("ignite"), |_| anyhow::bail!("no fuel"), true);
        registry.register(EventKey::before("ignite"), recorder(&log, "skipped"), true);
        registry.register(EventKey::AnyTransition(Phase::Before), recorder(&log, "any"), true);

        let err = registry.fire_before(&event(Stage::Before)).unwrap_err();

        assert!(matches!(err, MachineError::Listener { .. }));
        assert_eq!(*log.borrow(), vec!["blocker"]);
    }

    #[test]
    fn handles_from_other_registries_do_not_match() {
        let log: Log = Rc::default();
        let mut template = CallbackRegistry::new();
        template.register(EventKey::before("ignite"), recorder(&log, "shared"), true);

        let mut first = template.clone();
        let mut second = template.clone();
        let own = first.register(EventKey::before("ignite"), recorder(&log, "first"), true);
        second.register(EventKey::before("ignite"), recorder(&log, "second"), true);

        assert!(!second.unregister(&own));
        assert_eq!(second.len(), 2);
        assert!(first.unregister(&own));
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn unregister_removes_only_that_listener() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        let first = registry.register(EventKey::before("ignite"), recorder(&log, "first"), true);
        registry.register(EventKey::before("ignite"), recorder(&log, "second"), true);

        assert!(registry.unregister(&first));
        assert!(!registry.unregister(&first));
        assert_eq!(registry.len(), 1);

        registry.fire_before(&event(Stage::Before)).unwrap();
        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn unregistering_removed_non_bubbler_restores_propagation() {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        let blocker =
            registry.register(EventKey::before("ignite"), recorder(&log, "blocker"), false);
        registry.register(EventKey::AnyTransition(Phase::Before), recorder(&log, "any"), true);

        registry.unregister(&blocker);
        registry.fire_before(&event(Stage::Before)).unwrap();

        assert_eq!(*log.borrow(), vec!["any"]);
        assert_eq!(registry.listener_count(&EventKey::before("ignite")), 0);
    }

    #[test]
    fn cloned_registry_shares_listeners() {
        let log: Log = Rc::default();
        let mut template = CallbackRegistry::new();
        template.register(EventKey::before("ignite"), recorder(&log, "shared"), true);

        let instance = template.clone();
        instance.fire_before(&event(Stage::Before)).unwrap();
        template.fire_before(&event(Stage::Before)).unwrap();

        assert_eq!(*log.borrow(), vec!["shared", "shared"]);
    }

    #[test]
    fn plan_is_empty_without_listeners() {
        let registry = CallbackRegistry::new();
        assert!(registry.plan(&EventKey::enter("stalled")).is_empty());
        assert!(registry.is_empty());
    }
}
