//! Derived, name-addressable operations over a host and its machine.
//!
//! A [`CapabilityDispatcher`] answers `is_<state>`, `when_<state>`,
//! `<transition>`, `can_<transition>` and `on_<transition>` for every state
//! and transition of its definition, plus ad hoc operations registered at
//! runtime. Names are resolved through one registry; anything else is an
//! [`UnresolvedOperation`](crate::error::MachineError::UnresolvedOperation)
//! fault.

mod dispatcher;
mod operations;

pub use dispatcher::CapabilityDispatcher;
pub use operations::{operation_suffix, AdHocMethod, Operation, OperationRegistry, CORE_OPERATIONS};
