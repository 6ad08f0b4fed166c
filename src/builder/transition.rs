//! Builder for a single named transition.

use crate::core::State;

/// Builder collecting the entries of one transition.
///
/// # Example
///
/// ```rust
/// use turnstile::builder::TransitionBuilder;
///
/// let shift_up = TransitionBuilder::new("shift_up")
///     .entry("idling", "first_gear")
///     .entry("first_gear", "second_gear");
///
/// assert_eq!(shift_up.name(), "shift_up");
/// assert_eq!(shift_up.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct TransitionBuilder {
    pub(crate) name: String,
    pub(crate) entries: Vec<(State, State)>,
}

impl TransitionBuilder {
    /// Create a builder for the transition `name` with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Add a `from -> to` entry.
    pub fn entry(mut self, from: impl Into<State>, to: impl Into<State>) -> Self {
        self.entries.push((from.into(), to.into()));
        self
    }

    /// Add an entry applying from every state without a specific entry.
    pub fn from_any(self, to: impl Into<State>) -> Self {
        self.entry(State::wildcard(), to)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
