//! Event keys and the payload handed to listeners.

use crate::core::State;
use crate::error::MachineError;
use std::fmt;
use std::str::FromStr;

/// Phase of a transition a listener observes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            other => Err(MachineError::UnknownPhase(other.to_string())),
        }
    }
}

/// Target name selecting the wildcard transition tier in string form.
pub const ANY_TRANSITION: &str = "transition";

/// Target name selecting every state entry in string form.
pub const ANY_STATE: &str = "state";

/// What a listener is registered for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// A phase of one named transition
    Transition { name: String, phase: Phase },
    /// A phase of every transition, reached by bubbling
    AnyTransition(Phase),
    /// Entry into one state
    Enter(State),
    /// Entry into any state
    AnyEnter,
}

impl EventKey {
    pub fn before(transition: impl Into<String>) -> Self {
        Self::Transition {
            name: transition.into(),
            phase: Phase::Before,
        }
    }

    pub fn after(transition: impl Into<String>) -> Self {
        Self::Transition {
            name: transition.into(),
            phase: Phase::After,
        }
    }

    pub fn enter(state: impl Into<State>) -> Self {
        Self::Enter(state.into())
    }

    /// Build a key from its string form.
    ///
    /// `target` is a transition name, or `"transition"` for the wildcard
    /// tier. Phase `"enter"` makes `target` a state name, with `"state"`
    /// meaning any state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use turnstile::callbacks::{EventKey, Phase};
    ///
    /// assert_eq!(EventKey::parse("ignite", "before").unwrap(), EventKey::before("ignite"));
    /// assert_eq!(
    ///     EventKey::parse("transition", "after").unwrap(),
    ///     EventKey::AnyTransition(Phase::After)
    /// );
    /// assert_eq!(EventKey::parse("idling", "enter").unwrap(), EventKey::enter("idling"));
    /// assert!(EventKey::parse("ignite", "during").is_err());
    /// ```
    pub fn parse(target: &str, phase: &str) -> Result<Self, MachineError> {
        if phase == "enter" {
            return Ok(if target == ANY_STATE {
                Self::AnyEnter
            } else {
                Self::Enter(State::from(target))
            });
        }

        let phase = phase.parse::<Phase>()?;
        Ok(if target == ANY_TRANSITION {
            Self::AnyTransition(phase)
        } else {
            Self::Transition {
                name: target.to_string(),
                phase,
            }
        })
    }

    /// The tier a dispatch on this key bubbles to, if any.
    pub fn wildcard(&self) -> Option<EventKey> {
        match self {
            Self::Transition { phase, .. } => Some(Self::AnyTransition(*phase)),
            Self::Enter(_) => Some(Self::AnyEnter),
            Self::AnyTransition(_) | Self::AnyEnter => None,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transition { name, phase } => write!(f, "{name}:{phase}"),
            Self::AnyTransition(phase) => write!(f, "{ANY_TRANSITION}:{phase}"),
            Self::Enter(state) => write!(f, "{state}:enter"),
            Self::AnyEnter => write!(f, "{ANY_STATE}:enter"),
        }
    }
}

/// Which dispatch an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Before,
    Enter,
    After,
}

/// Payload passed to every listener.
///
/// In the before stage `from` is the current state and `to` the prospective
/// one. Once committed, `from` is the state left and `to` the state entered.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionEvent {
    pub transition: String,
    pub from: State,
    pub to: State,
    pub role: Option<String>,
    pub stage: Stage,
}

/// Signal returned by a listener.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Control {
    #[default]
    Continue,
    /// Abort the transition. Only honoured in the before stage.
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_parses_known_names() {
        assert_eq!("before".parse::<Phase>().unwrap(), Phase::Before);
        assert_eq!("after".parse::<Phase>().unwrap(), Phase::After);
        assert!(matches!(
            "enter".parse::<Phase>(),
            Err(MachineError::UnknownPhase(ref p)) if p == "enter"
        ));
    }

    #[test]
    fn parse_maps_wildcard_targets() {
        assert_eq!(
            EventKey::parse("transition", "before").unwrap(),
            EventKey::AnyTransition(Phase::Before)
        );
        assert_eq!(EventKey::parse("state", "enter").unwrap(), EventKey::AnyEnter);
        assert_eq!(
            EventKey::parse("park", "after").unwrap(),
            EventKey::after("park")
        );
    }

    #[test]
    fn wildcard_tier_matches_phase() {
        assert_eq!(
            EventKey::before("ignite").wildcard(),
            Some(EventKey::AnyTransition(Phase::Before))
        );
        assert_eq!(
            EventKey::after("ignite").wildcard(),
            Some(EventKey::AnyTransition(Phase::After))
        );
        assert_eq!(EventKey::enter("idling").wildcard(), Some(EventKey::AnyEnter));
        assert_eq!(EventKey::AnyEnter.wildcard(), None);
    }

    #[test]
    fn keys_display_in_string_form() {
        assert_eq!(EventKey::before("ignite").to_string(), "ignite:before");
        assert_eq!(
            EventKey::AnyTransition(Phase::After).to_string(),
            "transition:after"
        );
        assert_eq!(EventKey::enter("idling").to_string(), "idling:enter");
    }
}
