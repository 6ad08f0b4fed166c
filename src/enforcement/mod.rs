//! Strict validation of machine definitions.
//!
//! The engine itself accepts any table: unknown transitions are simply not
//! possible and states are whatever the table mentions. This module is an
//! opt-in stricter pass built on Stillwater's `Validation`, which accumulates
//! every violation instead of stopping at the first one.
//!
//! # Example
//!
//! ```rust
//! use stillwater::validation::Validation;
//! use turnstile::builder::DefinitionBuilder;
//! use turnstile::core::Rule;
//! use turnstile::enforcement::{validate, DefinitionViolation};
//!
//! let definition = DefinitionBuilder::new()
//!     .initial("parked")
//!     .transition("ignite", [("parked", "idling")])
//!     .transition("baz", Vec::<(&str, &str)>::new())
//!     .rule("hardwire", Rule::roles(["thief"]))
//!     .build()
//!     .unwrap();
//!
//! match validate(&definition) {
//!     Validation::Failure(violations) => assert_eq!(violations.len(), 2),
//!     Validation::Success(_) => unreachable!(),
//! }
//! ```

pub mod builder;
pub mod rules;
pub mod violations;

use crate::machine::MachineDefinition;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

// Re-export commonly used types
pub use builder::EnforcementBuilder;
pub use rules::{EnforcementRules, ValidationCheck};
pub use violations::{DefinitionViolation, ViolationStrategy};

/// Run every built-in check against `definition`.
pub fn validate(
    definition: &MachineDefinition,
) -> Validation<(), NonEmptyVec<DefinitionViolation>> {
    EnforcementRules::strict().enforce(definition)
}
