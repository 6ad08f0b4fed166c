//! Transition history tracking.
//!
//! Every successful `fire` appends one record. The engine never persists
//! history itself; hosts may include it in a snapshot.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use turnstile::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     transition: "ignite".to_string(),
///     from: "parked".into(),
///     to: "idling".into(),
///     role: Some("driver".to_string()),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to, "idling");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the transition that fired
    pub transition: String,
    /// The state being left
    pub from: State,
    /// The state entered
    pub to: State,
    /// Role the caller supplied, if any
    pub role: Option<String>,
    /// When the transition committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of committed transitions.
///
/// # Example
///
/// ```rust
/// use turnstile::core::{StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = StateHistory::new();
/// history.push(TransitionRecord {
///     transition: "ignite".to_string(),
///     from: "parked".into(),
///     to: "idling".into(),
///     role: None,
///     timestamp: Utc::now(),
/// });
/// history.push(TransitionRecord {
///     transition: "shift_up".to_string(),
///     from: "idling".into(),
///     to: "first_gear".into(),
///     role: None,
///     timestamp: Utc::now(),
/// });
///
/// let path = history.path();
/// assert_eq!(path.len(), 3); // parked -> idling -> first_gear
/// assert_eq!(path[2].as_str(), "first_gear");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    records: Vec<TransitionRecord>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TransitionRecord) {
        self.records.push(record);
    }

    /// States traversed: the first source, then each destination.
    pub fn path(&self) -> Vec<&State> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        path.extend(self.records.iter().map(|r| &r.to));
        path
    }

    /// Time between the first and last recorded transition.
    ///
    /// Returns `None` for an empty history.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(transition: &str, from: &str, to: &str) -> TransitionRecord {
        TransitionRecord {
            transition: transition.to_string(),
            from: from.into(),
            to: to.into(),
            role: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
        assert!(history.last().is_none());
    }

    #[test]
    fn path_returns_state_sequence() {
        let mut history = StateHistory::new();
        history.push(record("ignite", "parked", "idling"));
        history.push(record("shift_up", "idling", "first_gear"));
        history.push(record("crash", "first_gear", "stalled"));

        let path: Vec<&str> = history.path().into_iter().map(State::as_str).collect();
        assert_eq!(path, vec!["parked", "idling", "first_gear", "stalled"]);
        assert_eq!(history.last().unwrap().transition, "crash");
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = StateHistory::new();
        let start = Utc::now();

        let mut first = record("ignite", "parked", "idling");
        first.timestamp = start;
        history.push(first);

        let mut second = record("park", "idling", "parked");
        second.timestamp = start + chrono::Duration::milliseconds(250);
        history.push(second);

        assert_eq!(history.duration(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let mut history = StateHistory::new();
        history.push(record("ignite", "parked", "idling"));

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::new();
        history.push(record("ignite", "parked", "idling"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
