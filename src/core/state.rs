//! Opaque state identifiers.
//!
//! States carry no structure of their own. Any name a transition table
//! mentions is implicitly a valid state, so unknown names degrade to
//! "not possible" instead of failing.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Reserved source marker meaning "from any state".
pub const WILDCARD: &str = "*";

/// Name of a state.
///
/// A thin newtype over `String`: comparable, hashable, cheap to clone for
/// history tracking, and serialized as a bare string.
///
/// # Example
///
/// ```rust
/// use turnstile::core::State;
///
/// let parked = State::from("parked");
/// assert_eq!(parked.as_str(), "parked");
/// assert_eq!(parked, "parked");
/// assert!(!parked.is_wildcard());
/// assert!(State::from("*").is_wildcard());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(String);

impl State {
    /// Create a state from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wildcard source marker.
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Get the state's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the reserved wildcard source.
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for State {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for State {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&State> for State {
    fn from(state: &State) -> Self {
        state.clone()
    }
}

impl Borrow<str> for State {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for State {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for State {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for State {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
