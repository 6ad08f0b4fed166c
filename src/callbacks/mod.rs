//! Transition and state-entry callbacks.
//!
//! Listeners are keyed by an [`EventKey`]: a phase of one transition, a phase
//! of every transition, or entry into a state. Dispatch for a transition runs
//! the listeners registered for that transition first and then bubbles to the
//! wildcard tier, unless one of them was registered as non-bubbling.
//!
//! Listeners run synchronously in registration order. A before-stage listener
//! may return [`Control::Cancel`] to stop the transition; an error from any
//! listener aborts the rest of the dispatch and surfaces to the caller.

mod event;
mod registry;

pub use event::{Control, EventKey, Phase, Stage, TransitionEvent, ANY_STATE, ANY_TRANSITION};
pub use registry::{CallbackRegistry, DispatchPlan, Listener, ListenerHandle};
